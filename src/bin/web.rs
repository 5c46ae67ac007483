//! Single binary web server: club state in memory, API via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default so the app is reachable via DNS on a VPS.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080), ADMIN_PASSWORD.

use actix_web::{
    delete, get, http::header, patch, post,
    web::{self, Data, Json, Path},
    App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use async_trait::async_trait;
use chess_club_web::{
    generate_bracket, record_casual_match, report_champion, resolve_match, round_names,
    BracketTournament, Club, MatchOutcome, PlayerId, ReportError, TierFilter, WinnerReporter,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory state: the club plus accepted admin session tokens.
struct AppData {
    club: Club,
    tokens: HashSet<String>,
    admin_password: String,
}

type AppState = Data<RwLock<AppData>>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct LoginBody {
    password: String,
}

#[derive(Deserialize)]
struct AddPlayerBody {
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    points: u32,
}

#[derive(Deserialize)]
struct RecordMatchBody {
    winner_id: PlayerId,
    loser_id: PlayerId,
    #[serde(default)]
    points_exchanged: Option<u32>,
}

#[derive(Deserialize)]
struct TournamentWinnerBody {
    is_tournament_winner: bool,
}

#[derive(Deserialize)]
struct AddArchiveBody {
    month: String,
    first_place_id: PlayerId,
    second_place_id: PlayerId,
    third_place_id: PlayerId,
}

#[derive(Deserialize)]
struct GenerateBracketBody {
    #[serde(default)]
    tier_filter: TierFilter,
}

#[derive(Deserialize)]
struct ResolveMatchBody {
    round: usize,
    match_index: usize,
    #[serde(default)]
    winner_id: Option<PlayerId>,
}

/// Path segment: player id (e.g. /api/player/{player_id}/stats)
#[derive(Deserialize)]
struct PlayerPath {
    player_id: PlayerId,
}

/// Path segment: archive id (e.g. /api/admin/archives/{archive_id})
#[derive(Deserialize)]
struct ArchivePath {
    archive_id: Uuid,
}

/// Bearer token from the Authorization header, if present.
fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Whether the request carries a token issued by /api/admin/login.
fn authorized(data: &AppData, req: &HttpRequest) -> bool {
    match bearer_token(req) {
        Some(token) => data.tokens.contains(&token),
        None => false,
    }
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({ "error": "Authentication required" }))
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("lock error")
}

/// Current bracket plus its display round names, as one JSON payload.
fn tournament_payload(club: &Club) -> serde_json::Value {
    serde_json::json!({
        "tournament": club.tournament,
        "round_names": round_names(club.tournament.total_rounds()),
    })
}

/// Reporter over the shared state: the champion's tournament-winner flag is
/// persisted into the roster. Locks are taken per call, never held across awaits.
struct StateReporter {
    state: AppState,
}

#[async_trait]
impl WinnerReporter for StateReporter {
    async fn is_tournament_winner(&self, player: PlayerId) -> Result<bool, ReportError> {
        let g = self
            .state
            .read()
            .map_err(|_| ReportError::new("state lock poisoned"))?;
        Ok(g.club
            .player(player)
            .map(|p| p.is_tournament_winner)
            .unwrap_or(false))
    }

    async fn mark_tournament_winner(
        &self,
        player: PlayerId,
        winner: bool,
    ) -> Result<(), ReportError> {
        let mut g = self
            .state
            .write()
            .map_err(|_| ReportError::new("state lock poisoned"))?;
        g.club
            .set_tournament_winner(player, winner)
            .map_err(|e| ReportError::new(e.to_string()))
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "chess-club-web",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Exchange the admin password for a session token.
#[post("/api/admin/login")]
async fn api_login(state: AppState, body: Json<LoginBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    if body.password != g.admin_password {
        return HttpResponse::Unauthorized()
            .json(serde_json::json!({ "error": "Incorrect password" }));
    }
    let token = Uuid::new_v4().to_string();
    g.tokens.insert(token.clone());
    HttpResponse::Ok().json(serde_json::json!({ "success": true, "token": token }))
}

/// Invalidate the caller's session token.
#[post("/api/admin/logout")]
async fn api_logout(state: AppState, req: HttpRequest) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let removed = match bearer_token(&req) {
        Some(token) => g.tokens.remove(&token),
        None => false,
    };
    if removed {
        HttpResponse::Ok().json(serde_json::json!({ "success": true }))
    } else {
        unauthorized()
    }
}

/// Public leaderboard, sorted with champion/tournament-winner badges.
#[get("/api/leaderboard")]
async fn api_leaderboard(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(serde_json::json!({ "players": g.club.leaderboard() }))
}

/// Top three players for the podium display.
#[get("/api/leaderboard/top3")]
async fn api_top3(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(serde_json::json!({ "top3": g.club.top3() }))
}

/// One player's stats (404 if not found).
#[get("/api/player/{player_id}/stats")]
async fn api_player_stats(state: AppState, path: Path<PlayerPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let row = g
        .club
        .leaderboard()
        .into_iter()
        .find(|r| r.id == path.player_id);
    match row {
        Some(row) => HttpResponse::Ok().json(row),
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "Player not found" })),
    }
}

/// Monthly archives, newest first.
#[get("/api/archives")]
async fn api_archives(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(serde_json::json!({ "archives": g.club.archives }))
}

/// Current bracket with display round names (public, read-only).
#[get("/api/tournament")]
async fn api_get_tournament(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(tournament_payload(&g.club))
}

/// Full roster for the admin panel.
#[get("/api/admin/players")]
async fn api_admin_players(state: AppState, req: HttpRequest) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    if !authorized(&g, &req) {
        return unauthorized();
    }
    HttpResponse::Ok().json(serde_json::json!({ "players": g.club.players }))
}

/// Add a player to the roster.
#[post("/api/admin/players")]
async fn api_add_player(state: AppState, req: HttpRequest, body: Json<AddPlayerBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    if !authorized(&g, &req) {
        return unauthorized();
    }
    let email = body.email.clone().filter(|e| !e.trim().is_empty());
    match g.club.add_player(body.name.trim(), email, body.points) {
        Ok(id) => HttpResponse::Ok().json(serde_json::json!({ "player": g.club.player(id) })),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Remove a player from the roster.
#[delete("/api/admin/players/{player_id}")]
async fn api_remove_player(state: AppState, req: HttpRequest, path: Path<PlayerPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    if !authorized(&g, &req) {
        return unauthorized();
    }
    match g.club.remove_player(path.player_id) {
        Ok(removed) => HttpResponse::Ok().json(serde_json::json!({ "removed": removed })),
        Err(e) => HttpResponse::NotFound().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Record a casual match; the tier-gap formula fills in the stake when the
/// body omits it.
#[post("/api/admin/matches")]
async fn api_record_match(
    state: AppState,
    req: HttpRequest,
    body: Json<RecordMatchBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    if !authorized(&g, &req) {
        return unauthorized();
    }
    match record_casual_match(&mut g.club, body.winner_id, body.loser_id, body.points_exchanged) {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Set or clear a player's tournament-winner flag by hand.
#[patch("/api/admin/players/{player_id}/tournament-winner")]
async fn api_set_tournament_winner(
    state: AppState,
    req: HttpRequest,
    path: Path<PlayerPath>,
    body: Json<TournamentWinnerBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    if !authorized(&g, &req) {
        return unauthorized();
    }
    match g
        .club
        .set_tournament_winner(path.player_id, body.is_tournament_winner)
    {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "player": g.club.player(path.player_id) })),
        Err(e) => HttpResponse::NotFound().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Archive a month's podium.
#[post("/api/admin/archives")]
async fn api_add_archive(
    state: AppState,
    req: HttpRequest,
    body: Json<AddArchiveBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    if !authorized(&g, &req) {
        return unauthorized();
    }
    match g.club.add_archive(
        body.month.trim(),
        body.first_place_id,
        body.second_place_id,
        body.third_place_id,
    ) {
        Ok(entry) => HttpResponse::Ok().json(serde_json::json!({ "archive": entry })),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Remove an archive entry.
#[delete("/api/admin/archives/{archive_id}")]
async fn api_remove_archive(
    state: AppState,
    req: HttpRequest,
    path: Path<ArchivePath>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    if !authorized(&g, &req) {
        return unauthorized();
    }
    match g.club.remove_archive(path.archive_id) {
        Ok(removed) => HttpResponse::Ok().json(serde_json::json!({ "removed": removed })),
        Err(e) => HttpResponse::NotFound().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Generate a fresh bracket from the current roster under a tier filter.
/// Replaces any tournament in progress.
#[post("/api/admin/tournament/generate")]
async fn api_generate_tournament(
    state: AppState,
    req: HttpRequest,
    body: Json<GenerateBracketBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    if !authorized(&g, &req) {
        return unauthorized();
    }
    let entrants = g.club.participants_for(body.tier_filter);
    match generate_bracket(entrants, body.tier_filter) {
        Ok(t) => {
            log::info!(
                "Generated bracket: {} seeds, {} rounds",
                t.participants.len(),
                t.total_rounds()
            );
            g.club.tournament = t;
            HttpResponse::Ok().json(tournament_payload(&g.club))
        }
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Decide a bracket match. Crowned champions are reported into the roster
/// after the bracket transition is applied; a failed report returns 502
/// with the bracket already complete.
#[post("/api/admin/tournament/resolve")]
async fn api_resolve_tournament_match(
    state: AppState,
    req: HttpRequest,
    body: Json<ResolveMatchBody>,
) -> HttpResponse {
    let outcome = {
        let mut g = match state.write() {
            Ok(guard) => guard,
            Err(_) => return lock_error(),
        };
        if !authorized(&g, &req) {
            return unauthorized();
        }
        match resolve_match(
            &mut g.club.tournament,
            body.round,
            body.match_index,
            body.winner_id,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                return HttpResponse::BadRequest()
                    .json(serde_json::json!({ "error": e.to_string() }))
            }
        }
    };

    if let MatchOutcome::Champion { winner } = &outcome {
        let reporter = StateReporter {
            state: state.clone(),
        };
        match report_champion(winner, &reporter).await {
            Ok(()) => log::info!("Tournament champion: {}", winner.name),
            Err(e) => {
                log::error!("Champion report failed: {}", e);
                return HttpResponse::BadGateway()
                    .json(serde_json::json!({ "error": e.to_string() }));
            }
        }
    }

    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(tournament_payload(&g.club))
}

/// Discard the current bracket and return to the inactive state.
#[post("/api/admin/tournament/reset")]
async fn api_reset_tournament(state: AppState, req: HttpRequest) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    if !authorized(&g, &req) {
        return unauthorized();
    }
    g.club.tournament = BracketTournament::inactive();
    HttpResponse::Ok().json(tournament_payload(&g.club))
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_admin_password() -> String {
    "chess-club-admin".to_string()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let admin_password = match std::env::var("ADMIN_PASSWORD") {
        Ok(p) if !p.is_empty() => p,
        _ => {
            log::warn!("ADMIN_PASSWORD not set; using the built-in default");
            default_admin_password()
        }
    };
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(AppData {
        club: Club::new(),
        tokens: HashSet::new(),
        admin_password,
    }));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(favicon)
            .service(api_login)
            .service(api_logout)
            .service(api_leaderboard)
            .service(api_top3)
            .service(api_player_stats)
            .service(api_archives)
            .service(api_get_tournament)
            .service(api_admin_players)
            .service(api_add_player)
            .service(api_remove_player)
            .service(api_record_match)
            .service(api_set_tournament_winner)
            .service(api_add_archive)
            .service(api_remove_archive)
            .service(api_generate_tournament)
            .service(api_resolve_tournament_match)
            .service(api_reset_tournament)
    })
    .bind(bind)?
    .run()
    .await
}

async fn serve_index_async() -> HttpResponse {
    let html = include_str!("../../templates/index.html");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}
