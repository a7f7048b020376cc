use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Initialize the database (with retries), then serve HTTP.
    Serve(ServeArgs),
    /// Initialize the database only. Exits non-zero unless it succeeded.
    InitDb,
    /// Print the candidate database hosts in the order they are tried.
    Hosts,
}

#[derive(Clone, Debug, Args)]
pub struct ServeArgs {
    /// Listen address, overriding `server.bind`.
    #[arg(long)]
    pub bind: Option<String>,
}
