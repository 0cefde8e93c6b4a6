//! imsg MCP server
//!
//! Run with: imsg-server

use clap::Parser;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use imsg::config::{close_all, expand_path, permission_hint, StoreConfig};
use imsg::error::{ImsgError, Result};
use imsg::mcp::{
    get_tool_definitions, methods, InitializeResult, McpHandler, McpRequest, McpResponse,
    McpServer, ToolCallResult,
};
use imsg::pagination::{PageRequest, DEFAULT_LIMIT, MAX_LIMIT};
use imsg::types::{ContactQuery, MessageFilters};
use imsg::{ContactResolver, ResolverConfig, SearchEngine, Storage};

#[derive(Parser, Debug)]
#[command(name = "imsg-server")]
#[command(about = "MCP server for a local messaging archive and contacts")]
#[command(version)]
struct Args {
    /// Messaging archive path
    #[arg(
        long,
        env = "IMSG_MESSAGES_DB",
        default_value = imsg::config::DEFAULT_MESSAGES_DB
    )]
    messages_db: String,

    /// Directory searched for contact databases
    #[arg(
        long,
        env = "IMSG_CONTACTS_DIR",
        default_value = imsg::config::DEFAULT_CONTACTS_DIR
    )]
    contacts_dir: String,

    /// Explicit contact database (repeatable); skips discovery
    #[arg(long = "contacts-db", env = "IMSG_CONTACTS_DB", value_delimiter = ',')]
    contacts_db: Vec<String>,

    /// Cards read per contact database per search (0 = no cap)
    #[arg(long, env = "IMSG_CONTACT_SCAN_CAP", default_value_t = imsg::contacts::DEFAULT_PER_SOURCE_CAP)]
    contact_scan_cap: usize,

    /// Let contact lookup fall back to comparing normalized phone numbers
    #[arg(long, env = "IMSG_NORMALIZED_LOOKUP")]
    normalized_lookup: bool,

    /// Page size when a tool call gives no limit
    #[arg(long, env = "IMSG_DEFAULT_LIMIT", default_value_t = DEFAULT_LIMIT)]
    default_limit: usize,

    /// Largest page size a tool call may request
    #[arg(long, env = "IMSG_MAX_LIMIT", default_value_t = MAX_LIMIT)]
    max_limit: usize,

    /// Emit logs as JSON
    #[arg(long, env = "IMSG_LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn store_config(&self) -> StoreConfig {
        StoreConfig {
            messages_db: expand_path(&self.messages_db),
            contacts_dir: expand_path(&self.contacts_dir),
            contacts_dbs: self.contacts_db.iter().map(|p| expand_path(p)).collect(),
            resolver: ResolverConfig::with_cap(self.contact_scan_cap)
                .with_normalized_lookup(self.normalized_lookup),
        }
    }
}

/// Limit/offset arguments shared by every paginated tool
#[derive(Debug, Default, Deserialize)]
struct PageArgs {
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ConversationArgs {
    chat_guid: String,
}

#[derive(Debug, Deserialize)]
struct LookupArgs {
    handle: String,
}

fn parse_args<T: DeserializeOwned>(params: &Value) -> Result<T> {
    serde_json::from_value(params.clone())
        .map_err(|e| ImsgError::InvalidInput(format!("invalid arguments: {}", e)))
}

/// MCP request handler
struct ImsgHandler {
    messages: Storage,
    contacts: Vec<Storage>,
    resolver_config: ResolverConfig,
    default_limit: usize,
    max_limit: usize,
}

impl ImsgHandler {
    fn new(messages: Storage, contacts: Vec<Storage>, resolver_config: ResolverConfig) -> Self {
        Self {
            messages,
            contacts,
            resolver_config,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }

    fn with_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    fn engine(&self) -> SearchEngine<'_> {
        SearchEngine::new(&self.messages)
    }

    fn resolver(&self) -> ContactResolver<'_> {
        ContactResolver::with_config(&self.contacts, self.resolver_config)
    }

    fn page(&self, params: &Value) -> Result<PageRequest> {
        let args: PageArgs = parse_args(params)?;
        PageRequest::from_args(args.limit, args.offset, self.default_limit, self.max_limit)
    }

    fn handle_tool_call(&self, name: &str, params: Value) -> ToolCallResult {
        let params = if params.is_null() { json!({}) } else { params };

        let outcome = match name {
            "search_messages" => self.tool_search_messages(&params),
            "get_recent_messages" => self.tool_recent_messages(&params),
            "get_conversation_messages" => self.tool_conversation_messages(&params),
            "list_conversations" => self.tool_list_conversations(&params),
            "list_handles" => self.tool_list_handles(&params),
            "search_contacts" => self.tool_search_contacts(&params),
            "lookup_contact" => self.tool_lookup_contact(&params),
            _ => Err(ImsgError::InvalidInput(format!("unknown tool: {}", name))),
        };

        match outcome.and_then(|value| ToolCallResult::json(&value)) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                ToolCallResult::error(format!("{} failed: {}", name, e))
            }
        }
    }

    fn tool_search_messages(&self, params: &Value) -> Result<Value> {
        let filters: MessageFilters = parse_args(params)?;
        let page = self.page(params)?;
        Ok(serde_json::to_value(self.engine().search(&filters, page)?)?)
    }

    fn tool_recent_messages(&self, params: &Value) -> Result<Value> {
        let page = self.page(params)?;
        Ok(serde_json::to_value(self.engine().recent(page)?)?)
    }

    fn tool_conversation_messages(&self, params: &Value) -> Result<Value> {
        let args: ConversationArgs = parse_args(params)?;
        let page = self.page(params)?;
        Ok(serde_json::to_value(
            self.engine().conversation_messages(&args.chat_guid, page)?,
        )?)
    }

    fn tool_list_conversations(&self, params: &Value) -> Result<Value> {
        let page = self.page(params)?;
        Ok(serde_json::to_value(self.engine().list_chats(page)?)?)
    }

    fn tool_list_handles(&self, params: &Value) -> Result<Value> {
        let page = self.page(params)?;
        Ok(serde_json::to_value(self.engine().list_handles(page)?)?)
    }

    fn tool_search_contacts(&self, params: &Value) -> Result<Value> {
        let query: ContactQuery = parse_args(params)?;
        let page = self.page(params)?;
        Ok(serde_json::to_value(self.resolver().search_by_name(&query, page)?)?)
    }

    fn tool_lookup_contact(&self, params: &Value) -> Result<Value> {
        let args: LookupArgs = parse_args(params)?;
        Ok(serde_json::to_value(self.resolver().lookup_by_handle(&args.handle)?)?)
    }

    /// Touch the messaging store once so permission problems show up early
    fn probe(&self) {
        match self.messages.probe() {
            Ok(()) => tracing::info!(path = %self.messages.path().display(), "Messaging store ready"),
            Err(e) => tracing::warn!(
                error = %e,
                "{}",
                permission_hint(self.messages.path())
            ),
        }
    }

    fn close(&self) {
        close_all(std::iter::once(&self.messages).chain(self.contacts.iter()));
    }
}

impl McpHandler for ImsgHandler {
    fn handle_request(&self, request: McpRequest) -> McpResponse {
        match request.method.as_str() {
            methods::INITIALIZE => {
                let result = InitializeResult::default();
                McpResponse::success(request.id, json!(result))
            }
            methods::INITIALIZED => {
                // Notification, no response needed
                McpResponse::success(request.id, json!({}))
            }
            methods::PING => McpResponse::success(request.id, json!({})),
            methods::LIST_TOOLS => {
                let tools = get_tool_definitions();
                McpResponse::success(request.id, json!({"tools": tools}))
            }
            methods::LIST_RESOURCES => McpResponse::success(request.id, json!({"resources": []})),
            methods::CALL_TOOL => {
                let Some(name) = request.params.get("name").and_then(|v| v.as_str()) else {
                    let err = ImsgError::InvalidInput("tools/call needs a tool name".to_string());
                    return McpResponse::error(request.id, err.code(), err.to_string());
                };
                let arguments = request
                    .params
                    .get("arguments")
                    .cloned()
                    .unwrap_or(json!({}));

                let tool_result = self.handle_tool_call(name, arguments);
                McpResponse::success(request.id, json!(tool_result))
            }
            _ => McpResponse::error(
                request.id,
                -32601,
                format!("Method not found: {}", request.method),
            ),
        }
    }
}

fn init_logging(json: bool) {
    // stdout carries the protocol, so logs go to stderr
    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    if args.max_limit == 0 {
        return Err(ImsgError::Config("--max-limit must be at least 1".to_string()));
    }

    let config = args.store_config();
    let contacts = config.contact_stores()?;
    tracing::info!(
        messages = %config.messages_db.display(),
        contact_stores = contacts.len(),
        "imsg MCP server starting..."
    );
    for store in &contacts {
        tracing::debug!(store = store.label(), path = %store.path().display(), "Contact store");
    }

    let handler = ImsgHandler::new(config.messages_store(), contacts, config.resolver)
        .with_limits(args.default_limit, args.max_limit);
    handler.probe();

    let server = McpServer::new(handler);
    let outcome = server.run();

    server.handler().close();
    tracing::info!("imsg MCP server stopped");
    outcome
}
