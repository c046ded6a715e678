use clap::{Args, Parser, Subcommand};

/// Command-line interface of the tenant polls service.
#[derive(Parser, Debug)]
#[command(name = "tenant-polls")]
#[command(version, about = "Multi-tenant polls served per HTTP host")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create a domain, prompting for any value not given as a flag
    #[command(name = "createdomain")]
    CreateDomain(CreateDomainCli),
}

#[derive(Args, Debug)]
pub struct CreateDomainCli {
    /// Specifies the domain
    #[arg(long)]
    pub domain: Option<String>,

    /// Specifies the name
    #[arg(long)]
    pub name: Option<String>,

    /// Database to use instead of DATABASE_URL
    #[arg(long, value_name = "URL")]
    pub database: Option<String>,

    /// Verbosity level; 0 suppresses the confirmation message
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub verbosity: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["tenant-polls"]).expect("parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_createdomain_flags() {
        let cli = Cli::try_parse_from([
            "tenant-polls",
            "createdomain",
            "--domain",
            "example.com",
            "--name",
            "Example",
            "--database",
            "sqlite::memory:",
            "--verbosity",
            "0",
        ])
        .expect("parse");

        let Some(Command::CreateDomain(args)) = cli.command else {
            panic!("expected createdomain");
        };
        assert_eq!(args.domain.as_deref(), Some("example.com"));
        assert_eq!(args.name.as_deref(), Some("Example"));
        assert_eq!(args.database.as_deref(), Some("sqlite::memory:"));
        assert_eq!(args.verbosity, 0);
    }

    #[test]
    fn rejects_out_of_range_verbosity() {
        assert!(Cli::try_parse_from(["tenant-polls", "createdomain", "-v", "7"]).is_err());
    }
}
