//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Drive async core use cases on a process-wide runtime so Dart sees
//!   plain sync calls.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are reported through envelope `ok`/`message` fields; messages
//!   are the user-facing texts of `adoptly_core::MessageId`, internal error
//!   details only go to the log.
//! - `init_core` configures the process once; remote-backed calls fail with a
//!   stable message until it has succeeded.

use adoptly_core::config::ENV_DB_PATH;
use adoptly_core::remote::PageCursor;
use adoptly_core::service::account_service::AccountService;
use adoptly_core::service::chat_service::{ChatPeer, ChatService};
use adoptly_core::service::contact;
use adoptly_core::service::favorite_service::FavoriteService;
use adoptly_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    init_logging_from_config, open_db, ping as ping_inner, Chat, CoreConfig, DocumentStore,
    FirebaseAuth, FirestoreStore, HasMessage, LoadParams, LoadResult, MessageId, Pet, PetFilter,
    PetPagingSource, PetQuery, PagingSource, RepoError, ServiceError, ServiceResult, Species,
    SqliteChatRepository, UserRole,
};
use log::{info, warn};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;

const CHAT_DB_FILE_NAME: &str = "adoptly_chats.sqlite3";
const NOT_INITIALIZED: &str = "Core is not initialized; call init_core first.";
static CORE: OnceCell<CoreState> = OnceCell::new();
static FALLBACK_CHAT_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

struct CoreState {
    config: CoreConfig,
    runtime: Runtime,
    store: Arc<dyn DocumentStore>,
    accounts: AccountService<FirebaseAuth>,
    favorites: FavoriteService,
}

impl CoreState {
    fn build(config: CoreConfig) -> Result<Self, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("adoptly-core")
            .enable_all()
            .build()
            .map_err(|err| format!("runtime start failed: {err}"))?;
        let store: Arc<dyn DocumentStore> = Arc::new(
            FirestoreStore::new(&config.firebase)
                .map_err(|err| format!("remote store init failed: {err}"))?,
        );
        let auth = FirebaseAuth::new(&config.firebase)
            .map_err(|err| format!("auth client init failed: {err}"))?;
        Ok(Self {
            accounts: AccountService::new(auth, Arc::clone(&store)),
            favorites: FavoriteService::new(Arc::clone(&store)),
            store,
            runtime,
            config,
        })
    }
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Parses `config_toml`, applies `ADOPTLY_*` overrides and builds the
/// remote clients.
///
/// # FFI contract
/// - Sync call; performs no network I/O.
/// - Calling again with an equivalent config is a no-op success; a different
///   config is rejected because clients are process-wide.
/// - Starts file logging when `[logging] dir` is present.
#[flutter_rust_bridge::frb(sync)]
pub fn init_core(config_toml: String) -> ActionResponse {
    let config = match CoreConfig::from_toml_str(&config_toml) {
        Ok(config) => config,
        Err(err) => return ActionResponse::failure(format!("init_core failed: {err}")),
    };
    if let Err(err) = init_logging_from_config(&config.logging) {
        return ActionResponse::failure(format!("init_core failed: {err}"));
    }

    let requested = config.clone();
    match CORE.get_or_try_init(|| CoreState::build(config)) {
        Ok(state) if state.config == requested => {
            info!(
                "event=core_init module=ffi status=ok project={}",
                state.config.firebase.project_id
            );
            ActionResponse::success("Core initialized.")
        }
        Ok(_) => ActionResponse::failure(
            "init_core failed: core is already initialized with a different config",
        ),
        Err(err) => {
            warn!("event=core_init module=ffi status=error error={err}");
            ActionResponse::failure(format!("init_core failed: {err}"))
        }
    }
}

/// Sign-in result envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInResponse {
    pub ok: bool,
    /// Signed-in account id; also present when only email verification is pending.
    pub user_id: Option<String>,
    /// `volunteer|shelter` on success.
    pub role: Option<String>,
    /// Stable localization key of the failure, empty on success.
    pub message_key: String,
    pub message: String,
}

/// Signs in with email and password.
///
/// # FFI contract
/// - Blocks on network I/O; call from a background isolate.
/// - An unverified account fails with `error_email_not_verified` but keeps
///   its session, so `user_id` is still reported.
#[flutter_rust_bridge::frb(sync)]
pub fn account_sign_in(email: String, password: String) -> SignInResponse {
    let state = match core_state() {
        Ok(state) => state,
        Err(message) => {
            return SignInResponse {
                ok: false,
                user_id: None,
                role: None,
                message_key: MessageId::Unknown.key().to_string(),
                message,
            }
        }
    };

    let result = state
        .runtime
        .block_on(state.accounts.sign_in(&email, &password));
    match result {
        Ok(user) => SignInResponse {
            ok: true,
            user_id: Some(user.user_id().to_string()),
            role: Some(user.role.as_str().to_string()),
            message_key: String::new(),
            message: "Signed in.".to_string(),
        },
        Err(err) => {
            let pending = state.accounts.current_user();
            SignInResponse {
                ok: false,
                user_id: pending.as_ref().map(|user| user.user_id().to_string()),
                role: pending.map(|user| user.role.as_str().to_string()),
                message_key: err.message_id().key().to_string(),
                message: err.user_message(),
            }
        }
    }
}

/// Clears the current session.
#[flutter_rust_bridge::frb(sync)]
pub fn account_sign_out() -> ActionResponse {
    match core_state() {
        Ok(state) => {
            state.accounts.sign_out();
            ActionResponse::success("Signed out.")
        }
        Err(message) => ActionResponse::failure(message),
    }
}

/// Pet card projection for list screens.
#[derive(Debug, Clone, PartialEq)]
pub struct PetItem {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age_months: Option<i64>,
    pub city: Option<String>,
    pub cover_image: Option<String>,
    pub adopted: bool,
    pub is_favorite: bool,
    pub view_count: Option<u64>,
    pub created_at: i64,
}

/// One page of the pet listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PetPageResponse {
    pub ok: bool,
    pub items: Vec<PetItem>,
    /// Opaque token for the next page; `None` at the end of the listing.
    pub next_cursor: Option<String>,
    pub message: String,
}

impl PetPageResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            next_cursor: None,
            message: message.into(),
        }
    }
}

/// Loads one page of adoptable pets, newest first.
///
/// Input semantics:
/// - `species`: optional `dog|cat|bird|rabbit|other` filter.
/// - `cursor`: `None` for the first page, else the previous `next_cursor`.
///
/// # FFI contract
/// - Blocks on network I/O; call from a background isolate.
/// - The first page fetches `3 * page_size` items, later pages `page_size`.
/// - Pets carry the favorite flag of the signed-in shelter, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn pets_load_page(species: Option<String>, cursor: Option<String>) -> PetPageResponse {
    let state = match core_state() {
        Ok(state) => state,
        Err(message) => return PetPageResponse::failure(message),
    };
    let species = match species.as_deref().map(parse_species).transpose() {
        Ok(species) => species,
        Err(message) => return PetPageResponse::failure(message),
    };
    let key = match cursor.as_deref().map(decode_cursor).transpose() {
        Ok(key) => key,
        Err(message) => return PetPageResponse::failure(message),
    };

    let query = PetQuery {
        filter: PetFilter {
            species,
            ..PetFilter::default()
        },
        ..PetQuery::default()
    };
    let mut source = PetPagingSource::new(Arc::clone(&state.store), query);
    if let Some(user) = state.accounts.current_user() {
        if user.role == UserRole::Shelter {
            source = source.viewed_by_shelter(user.user_id());
        }
    }
    let paging = state.config.paging;
    let load_size = if key.is_none() {
        paging.initial_load_size()
    } else {
        paging.page_size
    };

    match state
        .runtime
        .block_on(source.load(LoadParams { key, load_size }))
    {
        LoadResult::Page(page) => {
            let next_cursor = match page.next_key.as_ref().map(encode_cursor).transpose() {
                Ok(next) => next,
                Err(message) => return PetPageResponse::failure(message),
            };
            let items = page.data.into_iter().map(to_pet_item).collect::<Vec<_>>();
            let message = format!("Loaded {} pet(s).", items.len());
            PetPageResponse {
                ok: true,
                items,
                next_cursor,
                message,
            }
        }
        LoadResult::Error(message) => PetPageResponse::failure(message),
    }
}

/// Favorite toggle result envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteResponse {
    pub ok: bool,
    /// Favorite state after the call.
    pub is_favorite: bool,
    pub message: String,
}

/// Flips the signed-in shelter's favorite mark on `pet_id`.
///
/// # FFI contract
/// - Blocks on network I/O; call from a background isolate.
/// - Only shelter accounts keep favorites.
#[flutter_rust_bridge::frb(sync)]
pub fn favorite_toggle(pet_id: String) -> FavoriteResponse {
    let failure = |message: String| FavoriteResponse {
        ok: false,
        is_favorite: false,
        message,
    };
    let state = match core_state() {
        Ok(state) => state,
        Err(message) => return failure(message),
    };
    let user = match state.accounts.require_session() {
        Ok(user) => user,
        Err(err) => return failure(err.user_message()),
    };
    if user.role != UserRole::Shelter {
        return failure(MessageId::PermissionDenied.default_text().to_string());
    }

    match state
        .runtime
        .block_on(state.favorites.toggle(user.user_id(), pet_id.trim()))
    {
        Ok(is_favorite) => FavoriteResponse {
            ok: true,
            is_favorite,
            message: if is_favorite {
                "Added to favorites.".to_string()
            } else {
                "Removed from favorites.".to_string()
            },
        },
        Err(err) => failure(err.user_message()),
    }
}

/// Cached conversation projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatItem {
    pub id: i64,
    pub peer_id: String,
    pub peer_name: String,
    pub peer_image: Option<String>,
    pub peer_phone: Option<String>,
    pub last_message: Option<String>,
    pub updated_at: i64,
}

/// Chat history response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatListResponse {
    pub ok: bool,
    /// Most recently updated first.
    pub items: Vec<ChatItem>,
    /// Stable localization key of the failure, empty on success.
    pub message_key: String,
    pub message: String,
}

/// Chat mutation response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatActionResponse {
    pub ok: bool,
    /// Local row id of the recorded chat.
    pub chat_id: Option<i64>,
    /// Stable localization key of the failure, empty on success.
    pub message_key: String,
    pub message: String,
}

impl ChatActionResponse {
    fn success(message: impl Into<String>, chat_id: Option<i64>) -> Self {
        Self {
            ok: true,
            chat_id,
            message_key: String::new(),
            message: message.into(),
        }
    }

    fn failure(call: &str, err: &ServiceError) -> Self {
        let (message_key, message) = report_failure(call, err);
        Self {
            ok: false,
            chat_id: None,
            message_key,
            message,
        }
    }
}

/// Records that a conversation with a peer was opened or continued.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Keeps one row per `peer_id`; missing optional fields keep cached values.
#[flutter_rust_bridge::frb(sync)]
pub fn chat_record(
    peer_id: String,
    peer_name: String,
    peer_image: Option<String>,
    peer_phone: Option<String>,
    last_message: Option<String>,
) -> ChatActionResponse {
    let peer = ChatPeer {
        peer_id: peer_id.trim().to_string(),
        peer_name: peer_name.trim().to_string(),
        peer_image,
        peer_phone,
    };
    match with_chat_service(|service| {
        service.record_conversation(&peer, last_message.as_deref())
    }) {
        Ok(chat) => ChatActionResponse::success("Chat recorded.", Some(chat.id)),
        Err(err) => ChatActionResponse::failure("chat_record", &err),
    }
}

/// Lists cached conversations.
#[flutter_rust_bridge::frb(sync)]
pub fn chat_list() -> ChatListResponse {
    match with_chat_service(|service| service.list_chats()) {
        Ok(chats) => {
            let items = chats.into_iter().map(to_chat_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No chats.".to_string()
            } else {
                format!("Found {} chat(s).", items.len())
            };
            ChatListResponse {
                ok: true,
                items,
                message_key: String::new(),
                message,
            }
        }
        Err(err) => {
            let (message_key, message) = report_failure("chat_list", &err);
            ChatListResponse {
                ok: false,
                items: Vec::new(),
                message_key,
                message,
            }
        }
    }
}

/// Removes a cached conversation by local row id.
#[flutter_rust_bridge::frb(sync)]
pub fn chat_delete(chat_id: i64) -> ChatActionResponse {
    match with_chat_service(|service| service.delete_chat(chat_id)) {
        Ok(()) => ChatActionResponse::success("Chat deleted.", Some(chat_id)),
        Err(err) => ChatActionResponse::failure("chat_delete", &err),
    }
}

/// Contact deep-link response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResponse {
    pub ok: bool,
    pub url: Option<String>,
    /// Stable localization key of the failure, empty on success.
    pub message_key: String,
    pub message: String,
}

impl LinkResponse {
    fn from_result(call: &str, result: ServiceResult<String>) -> Self {
        match result {
            Ok(url) => Self {
                ok: true,
                url: Some(url),
                message_key: String::new(),
                message: String::new(),
            },
            Err(err) => {
                let (message_key, message) = report_failure(call, &err);
                Self {
                    ok: false,
                    url: None,
                    message_key,
                    message,
                }
            }
        }
    }
}

/// Builds a `https://wa.me/` chat link with an optional prefilled message.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_whatsapp_link(phone: String, message: String) -> LinkResponse {
    LinkResponse::from_result("contact_whatsapp_link", contact::whatsapp_link(&phone, &message))
}

/// Builds a `tel:` dial link.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_phone_link(phone: String) -> LinkResponse {
    LinkResponse::from_result("contact_phone_link", contact::phone_link(&phone))
}

/// Builds a `mailto:` link; empty subject/body are omitted.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_email_link(address: String, subject: String, body: String) -> LinkResponse {
    LinkResponse::from_result("contact_email_link", contact::email_link(&address, &subject, &body))
}

fn core_state() -> Result<&'static CoreState, String> {
    CORE.get().ok_or_else(|| NOT_INITIALIZED.to_string())
}

fn resolve_chat_db_path() -> PathBuf {
    if let Some(state) = CORE.get() {
        return state.config.storage.resolved_chat_db_path();
    }
    FALLBACK_CHAT_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(ENV_DB_PATH) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(CHAT_DB_FILE_NAME)
        })
        .clone()
}

fn with_chat_service<T>(
    f: impl FnOnce(&ChatService<SqliteChatRepository<'_>>) -> ServiceResult<T>,
) -> ServiceResult<T> {
    let db_path = resolve_chat_db_path();
    let conn = open_db(&db_path).map_err(RepoError::from)?;
    let repo = SqliteChatRepository::try_new(&conn)?;
    let service = ChatService::new(repo);
    f(&service)
}

/// Logs the internal error and returns the localization key and text shown to the user.
fn report_failure(call: &str, err: &ServiceError) -> (String, String) {
    warn!("event={call} module=ffi status=error error={err}");
    (err.message_id().key().to_string(), err.user_message())
}

fn parse_species(raw: &str) -> Result<Species, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "dog" => Ok(Species::Dog),
        "cat" => Ok(Species::Cat),
        "bird" => Ok(Species::Bird),
        "rabbit" => Ok(Species::Rabbit),
        "other" => Ok(Species::Other),
        other => Err(format!("unsupported species `{other}`")),
    }
}

fn encode_cursor(cursor: &PageCursor) -> Result<String, String> {
    serde_json::to_string(cursor).map_err(|err| format!("cursor encode failed: {err}"))
}

fn decode_cursor(raw: &str) -> Result<PageCursor, String> {
    serde_json::from_str(raw).map_err(|_| "invalid page cursor".to_string())
}

fn to_pet_item(pet: Pet) -> PetItem {
    PetItem {
        cover_image: pet.cover_image().map(str::to_string),
        species: pet.species.as_str().to_string(),
        id: pet.id,
        owner_id: pet.owner_id,
        name: pet.name,
        breed: pet.breed,
        age_months: pet.age_months,
        city: pet.city,
        adopted: pet.adopted,
        is_favorite: pet.is_favorite,
        view_count: pet.view_count,
        created_at: pet.created_at,
    }
}

fn to_chat_item(chat: Chat) -> ChatItem {
    ChatItem {
        id: chat.id,
        peer_id: chat.peer_id,
        peer_name: chat.peer_name,
        peer_image: chat.peer_image,
        peer_phone: chat.peer_phone,
        last_message: chat.last_message,
        updated_at: chat.updated_at,
    }
}
