//! imsg CLI
//!
//! Command-line access to the same searches the MCP server exposes.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use imsg::config::{close_all, expand_path, DEFAULT_CONTACTS_DIR, DEFAULT_MESSAGES_DB};
use imsg::error::Result;
use imsg::pagination::{PageRequest, DEFAULT_LIMIT, MAX_LIMIT};
use imsg::types::{ContactQuery, MessageFilters};
use imsg::{ContactResolver, ResolverConfig, SearchEngine, StoreConfig};

#[derive(Parser)]
#[command(name = "imsg")]
#[command(about = "Search a local messaging archive and contacts")]
#[command(version)]
struct Cli {
    /// Messaging archive path
    #[arg(long, env = "IMSG_MESSAGES_DB", default_value = DEFAULT_MESSAGES_DB)]
    messages_db: String,

    /// Directory searched for contact databases
    #[arg(long, env = "IMSG_CONTACTS_DIR", default_value = DEFAULT_CONTACTS_DIR)]
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

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Copy)]
struct PageOpts {
    /// Page size (1-200)
    #[arg(short, long, default_value_t = DEFAULT_LIMIT as i64)]
    limit: i64,
    /// Rows to skip
    #[arg(short, long, default_value_t = 0)]
    offset: i64,
}

impl PageOpts {
    fn request(self) -> Result<PageRequest> {
        PageRequest::from_args(Some(self.limit), Some(self.offset), DEFAULT_LIMIT, MAX_LIMIT)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search messages
    Search {
        /// Text the message must contain
        #[arg(short, long)]
        text: Option<String>,
        /// Exact sender handle
        #[arg(short = 'H', long)]
        handle: Option<String>,
        /// Earliest message time (RFC 3339)
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Latest message time (RFC 3339)
        #[arg(long)]
        until: Option<DateTime<Utc>>,
        #[command(flatten)]
        page: PageOpts,
    },
    /// Most recent messages
    Recent {
        #[command(flatten)]
        page: PageOpts,
    },
    /// List conversations
    Chats {
        #[command(flatten)]
        page: PageOpts,
    },
    /// List handles
    Handles {
        #[command(flatten)]
        page: PageOpts,
    },
    /// Messages in one conversation
    Conversation {
        /// Conversation guid
        chat_guid: String,
        #[command(flatten)]
        page: PageOpts,
    },
    /// Search contacts by name
    Contacts {
        /// First name, or any name fragment when no last name is given
        first_name: Option<String>,
        /// Last name fragment
        last_name: Option<String>,
        #[command(flatten)]
        page: PageOpts,
    },
    /// Find the contact owning a phone number or email
    Lookup {
        /// Phone number or email address
        handle: String,
    },
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let config = StoreConfig {
        messages_db: expand_path(&cli.messages_db),
        contacts_dir: expand_path(&cli.contacts_dir),
        contacts_dbs: cli.contacts_db.iter().map(|p| expand_path(p)).collect(),
        resolver: ResolverConfig::with_cap(cli.contact_scan_cap)
            .with_normalized_lookup(cli.normalized_lookup),
    };

    let messages = config.messages_store();
    let engine = SearchEngine::new(&messages);

    let outcome = match cli.command {
        Commands::Search {
            text,
            handle,
            since,
            until,
            page,
        } => {
            let filters = MessageFilters {
                text,
                handle,
                start_time: since,
                end_time: until,
            };
            engine
                .search(&filters, page.request()?)
                .and_then(|r| print_json(&r))
        }

        Commands::Recent { page } => engine.recent(page.request()?).and_then(|r| print_json(&r)),

        Commands::Chats { page } => engine
            .list_chats(page.request()?)
            .and_then(|r| print_json(&r)),

        Commands::Handles { page } => engine
            .list_handles(page.request()?)
            .and_then(|r| print_json(&r)),

        Commands::Conversation { chat_guid, page } => engine
            .conversation_messages(&chat_guid, page.request()?)
            .and_then(|r| print_json(&r)),

        Commands::Contacts {
            first_name,
            last_name,
            page,
        } => {
            let contacts = config.contact_stores()?;
            let query = ContactQuery::new(first_name.unwrap_or_default(), last_name);
            let result = ContactResolver::with_config(&contacts, config.resolver)
                .search_by_name(&query, page.request()?)
                .and_then(|r| print_json(&r));
            close_all(&contacts);
            result
        }

        Commands::Lookup { handle } => {
            let contacts = config.contact_stores()?;
            let result = ContactResolver::with_config(&contacts, config.resolver)
                .lookup_by_handle(&handle)
                .and_then(|r| print_json(&r));
            close_all(&contacts);
            result
        }
    };

    close_all([&messages]);
    outcome
}
