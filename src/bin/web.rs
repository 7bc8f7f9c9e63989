//! Single binary web server: JSON command layer over in-memory tournaments.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT, CATALOG_PATH,
//! TICK_INTERVAL_SECS, PRESENCE_TIMEOUT_SECS.

use actix_web::{
    get, post,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::{DateTime, TimeDelta, Utc};
use elimination_bracket::{
    check_team_preview, disqualify_participants, mark_match_started, report_win, start_tournament, tick,
    ActivityProbe, ElementCatalog, ParticipantId, RulesProvider, ServerConfig, StandardCriteria, TagCriteria, Team,
    TeamChangeRecord, Tournament, TournamentConfig, TournamentError, TournamentId, TournamentSnapshot,
    VariantCriteria,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Who has been seen recently, and who confirmed their match is under way.
struct Presence {
    last_seen: HashMap<ParticipantId, DateTime<Utc>>,
    playing: HashSet<ParticipantId>,
    timeout: TimeDelta,
    now: DateTime<Utc>,
}

impl Presence {
    fn new(timeout: TimeDelta) -> Self {
        Self {
            last_seen: HashMap::new(),
            playing: HashSet::new(),
            timeout,
            now: Utc::now(),
        }
    }
}

impl ActivityProbe for Presence {
    fn is_reachable(&self, participant: ParticipantId) -> bool {
        self.last_seen
            .get(&participant)
            .is_some_and(|seen| self.now - *seen <= self.timeout)
    }

    fn is_playing(&self, participant: ParticipantId) -> bool {
        self.playing.contains(&participant)
    }
}

/// Per-tournament entry: tournament data, presence, and last activity time (for auto-cleanup).
struct TournamentEntry {
    tournament: Tournament,
    presence: Presence,
    last_activity: Instant,
}

/// In-memory state: many tournaments by ID. Entries are removed after 12h inactivity.
type AppState = Data<RwLock<HashMap<TournamentId, TournamentEntry>>>;

/// Inactivity threshold: tournaments not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

struct ServerData {
    catalog_path: Option<PathBuf>,
    presence_timeout: TimeDelta,
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct NewParticipant {
    name: String,
    #[serde(default)]
    team: Option<Team>,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    #[serde(default)]
    config: TournamentConfig,
    /// Single-tag variant: only elements carrying this tag may start or be transformed into.
    #[serde(default)]
    variant_tag: Option<String>,
    participants: Vec<NewParticipant>,
}

#[derive(Deserialize)]
struct ReportResultBody {
    winner: ParticipantId,
    loser: ParticipantId,
    #[serde(default = "default_score")]
    score: (u32, u32),
    #[serde(default)]
    loser_team: Option<Team>,
}

fn default_score() -> (u32, u32) {
    (1, 0)
}

#[derive(Deserialize)]
struct DisqualifyBody {
    participant_ids: Vec<ParticipantId>,
}

#[derive(Deserialize)]
struct ObservedTeam {
    participant_id: ParticipantId,
    team: Team,
}

#[derive(Deserialize)]
struct TeamPreviewBody {
    teams: Vec<ObservedTeam>,
}

#[derive(Serialize)]
struct ParticipantDetail<'a> {
    id: ParticipantId,
    name: &'a str,
    round: u32,
    eliminated: bool,
    disqualified: bool,
    opponent: Option<ParticipantId>,
    required_team: Option<&'a Team>,
    possible_teams: Vec<&'a Team>,
    team_changes: &'a [TeamChangeRecord],
}

#[derive(Serialize)]
struct ChangesResponse {
    team_changes: Vec<TeamChangeRecord>,
    tournament: TournamentSnapshot,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and participant id.
#[derive(Deserialize)]
struct TournamentParticipantPath {
    id: TournamentId,
    participant_id: ParticipantId,
}

fn load_catalog(path: Option<&PathBuf>, criteria: Arc<dyn VariantCriteria>) -> Result<ElementCatalog, TournamentError> {
    match path {
        Some(path) => ElementCatalog::from_path(path, criteria),
        None => ElementCatalog::bundled(criteria),
    }
}

/// Map an engine error to a response: broken invariants are server errors, the rest are
/// rejected commands.
fn error_response(e: TournamentError) -> HttpResponse {
    if e.is_fatal() {
        log::error!("engine invariant violated: {e}");
        HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() }))
    } else {
        HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
    }
}

fn no_tournament() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
}

/// Hand drained events to the outside world (here: the log).
fn flush_events(tournament: &mut Tournament) {
    for event in tournament.drain_events() {
        match serde_json::to_string(&event) {
            Ok(json) => log::info!("tournament {} event {json}", tournament.id),
            Err(e) => log::warn!("could not serialize event: {e}"),
        }
    }
}

fn changes_response(tournament: &mut Tournament, team_changes: Vec<TeamChangeRecord>) -> HttpResponse {
    flush_events(tournament);
    HttpResponse::Ok().json(ChangesResponse {
        team_changes,
        tournament: tournament.snapshot(),
    })
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "elimination-bracket",
    })
}

/// Create a tournament, register everyone and build the bracket.
#[post("/api/tournaments")]
async fn api_create_tournament(
    state: AppState,
    server: Data<ServerData>,
    body: Json<CreateTournamentBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let criteria: Arc<dyn VariantCriteria> = match body.variant_tag {
        Some(tag) => Arc::new(TagCriteria::new(tag)),
        None => Arc::new(StandardCriteria),
    };
    let rules: Arc<dyn RulesProvider> = match load_catalog(server.catalog_path.as_ref(), criteria) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => return error_response(e),
    };
    let mut tournament = Tournament::new(body.config, rules);
    for p in body.participants {
        let added = match p.team {
            Some(team) => tournament.add_participant_with_team(p.name, team),
            None => tournament.add_participant(p.name),
        };
        if let Err(e) = added {
            return error_response(e);
        }
    }
    let byes = match start_tournament(&mut tournament) {
        Ok(records) => records,
        Err(e) => return error_response(e),
    };

    let mut presence = Presence::new(server.presence_timeout);
    let now = Utc::now();
    for p in tournament.participants() {
        presence.last_seen.insert(p.id, now);
    }
    let id = tournament.id;
    let response = changes_response(&mut tournament, byes);

    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    g.insert(
        id,
        TournamentEntry {
            tournament,
            presence,
            last_activity: Instant::now(),
        },
    );
    response
}

/// Get a tournament snapshot by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&path.id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            HttpResponse::Ok().json(entry.tournament.snapshot())
        }
        None => no_tournament(),
    }
}

/// Matches grouped by round, for bracket rendering.
#[get("/api/tournaments/{id}/rounds")]
async fn api_get_rounds(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get(&path.id) {
        Some(entry) => HttpResponse::Ok().json(entry.tournament.matches_by_round()),
        None => no_tournament(),
    }
}

/// Report the result of an open match.
#[post("/api/tournaments/{id}/results")]
async fn api_report_result(state: AppState, path: Path<TournamentPath>, body: Json<ReportResultBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let body = body.into_inner();
    entry.presence.playing.remove(&body.winner);
    entry.presence.playing.remove(&body.loser);
    let t = &mut entry.tournament;
    match report_win(t, body.winner, body.loser, body.score, body.loser_team) {
        Ok(records) => changes_response(t, records),
        Err(e) => error_response(e),
    }
}

/// Disqualify participants (organiser action).
#[post("/api/tournaments/{id}/disqualify")]
async fn api_disqualify(state: AppState, path: Path<TournamentPath>, body: Json<DisqualifyBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match disqualify_participants(t, &body.participant_ids) {
        Ok(records) => changes_response(t, records),
        Err(e) => error_response(e),
    }
}

/// Check the teams shown at team preview; impossible teams are disqualified.
#[post("/api/tournaments/{id}/team-preview")]
async fn api_team_preview(state: AppState, path: Path<TournamentPath>, body: Json<TeamPreviewBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let observed: Vec<(ParticipantId, Team)> = body
        .into_inner()
        .teams
        .into_iter()
        .map(|o| (o.participant_id, o.team))
        .collect();
    let t = &mut entry.tournament;
    match check_team_preview(t, &observed) {
        Ok(records) => changes_response(t, records),
        Err(e) => error_response(e),
    }
}

/// Participant is connected.
#[post("/api/tournaments/{id}/participants/{participant_id}/heartbeat")]
async fn api_heartbeat(state: AppState, path: Path<TournamentParticipantPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    if entry.tournament.participant(path.participant_id).is_none() {
        return error_response(TournamentError::ParticipantNotFound(path.participant_id));
    }
    entry.last_activity = Instant::now();
    entry.presence.last_seen.insert(path.participant_id, Utc::now());
    HttpResponse::NoContent().finish()
}

/// Participant confirms their open match is under way.
#[post("/api/tournaments/{id}/participants/{participant_id}/started")]
async fn api_match_started(state: AppState, path: Path<TournamentParticipantPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    match mark_match_started(&mut entry.tournament, path.participant_id) {
        Ok(()) => {
            entry.presence.playing.insert(path.participant_id);
            if let Some(opponent) = entry.tournament.current_opponent(path.participant_id) {
                entry.presence.playing.insert(opponent);
            }
            HttpResponse::NoContent().finish()
        }
        Err(e) => error_response(e),
    }
}

/// Opponent, possible teams and team change history of one participant.
#[get("/api/tournaments/{id}/participants/{participant_id}")]
async fn api_get_participant(state: AppState, path: Path<TournamentParticipantPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    let t = &entry.tournament;
    let Some(p) = t.participant(path.participant_id) else {
        return error_response(TournamentError::ParticipantNotFound(path.participant_id));
    };
    HttpResponse::Ok().json(ParticipantDetail {
        id: p.id,
        name: &p.name,
        round: p.round,
        eliminated: p.eliminated,
        disqualified: p.disqualified,
        opponent: t.current_opponent(p.id),
        required_team: p.required_team(),
        possible_teams: p.possible_teams.iter().collect(),
        team_changes: &p.team_changes,
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cfg = ServerConfig::from_env();

    // Fail fast on a broken catalog instead of on the first create request.
    if let Err(e) = load_catalog(cfg.catalog_path.as_ref(), Arc::new(StandardCriteria)) {
        log::error!("{e}");
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()));
    }

    log::info!("Starting server at http://{}:{}", cfg.host, cfg.port);

    let state = Data::new(RwLock::new(HashMap::<TournamentId, TournamentEntry>::new()));
    let server = Data::new(ServerData {
        catalog_path: cfg.catalog_path.clone(),
        presence_timeout: cfg.presence_timeout,
    });

    // Background task: fire due activity timers, and drop tournaments inactive for 12+ hours.
    let state_ticker = state.clone();
    let tick_interval = cfg.tick_interval;
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(tick_interval);
        loop {
            interval.tick().await;
            let mut g = match state_ticker.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            for entry in g.values_mut() {
                entry.presence.now = Utc::now();
                if let Err(e) = tick(&mut entry.tournament, &entry.presence) {
                    log::error!("activity tick failed for tournament {}: {e}", entry.tournament.id);
                }
                flush_events(&mut entry.tournament);
            }
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive tournament(s) (no activity for 12h)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(server.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_get_rounds)
            .service(api_report_result)
            .service(api_disqualify)
            .service(api_team_preview)
            .service(api_heartbeat)
            .service(api_match_started)
            .service(api_get_participant)
    })
    .bind((cfg.host.as_str(), cfg.port))?
    .run()
    .await
}
