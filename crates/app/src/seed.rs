//! The `createdomain` command: creates one domain, prompting for whatever was
//! not supplied on the command line.

use std::io::{self, BufRead, IsTerminal, Write};

use thiserror::Error;
use tracing::info;

use tenant_polls_core::types::{DomainInput, DOMAIN_FIELD, NAME_FIELD};
use tenant_polls_core::validation::{clean_char_field, FieldSpec};
use tenant_polls_core::{Domain, ValidationErrors};
use tenant_polls_storage::{DomainError, DomainRepository};

pub const SKIPPED_MESSAGE: &str = "Domain creation skipped due to not running in a TTY.";
pub const CREATED_MESSAGE: &str = "Domain created successfully.";
pub const CANCELLED_MESSAGE: &str = "\nOperation cancelled.";
const IN_USE_MESSAGE: &str = "Error: That domain is already in use.";

/// Terminal the command talks to.
pub trait Console {
    fn is_interactive(&self) -> bool;

    /// Shows `message` and reads one line. `None` means end of input.
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>>;

    fn write_out(&mut self, line: &str);

    fn write_err(&mut self, line: &str);
}

/// Console over the process's standard streams.
pub struct StdConsole;

impl Console for StdConsole {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(message.as_bytes())?;
        stdout.flush()?;
        drop(stdout);

        // Reading blocks this worker; Ctrl-C is watched from the main task.
        tokio::task::block_in_place(|| -> io::Result<Option<String>> {
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let trimmed = line.trim_end_matches(['\n', '\r']).len();
            line.truncate(trimmed);
            Ok(Some(line))
        })
    }

    fn write_out(&mut self, line: &str) {
        println!("{line}");
    }

    fn write_err(&mut self, line: &str) {
        eprintln!("{line}");
    }
}

/// Values supplied through command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CreateDomainArgs {
    pub domain: Option<String>,
    pub name: Option<String>,
    pub verbosity: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Created(Domain),
    Skipped,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("{0} cannot be blank.")]
    Blank(String),
    #[error("{0}")]
    Invalid(ValidationErrors),
    #[error("That domain is already in use.")]
    DomainInUse,
    #[error("Operation cancelled.")]
    Cancelled,
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
    #[error("failed to save domain: {0}")]
    Storage(DomainError),
}

impl From<DomainError> for SeedError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(errors) => Self::Invalid(errors),
            DomainError::Duplicate => Self::DomainInUse,
            other => Self::Storage(other),
        }
    }
}

pub struct CreateDomainCommand {
    domains: DomainRepository,
}

impl CreateDomainCommand {
    pub fn new(domains: DomainRepository) -> Self {
        Self { domains }
    }

    pub async fn run<C: Console>(
        &self,
        args: CreateDomainArgs,
        console: &mut C,
    ) -> Result<SeedOutcome, SeedError> {
        let CreateDomainArgs {
            domain,
            name,
            verbosity,
        } = args;

        if domain.as_deref() == Some("") {
            return Err(SeedError::Blank(DOMAIN_FIELD.label()));
        }
        if name.as_deref() == Some("") {
            return Err(SeedError::Blank(NAME_FIELD.label()));
        }

        let input = if console.is_interactive() {
            let domain = match domain {
                Some(value) => {
                    if self.accept_domain(&value, console).await? {
                        value
                    } else {
                        self.prompt_domain(console).await?
                    }
                }
                None => self.prompt_domain(console).await?,
            };
            let name = match name {
                Some(value) if accept_field(&NAME_FIELD, &value, console) => value,
                _ => prompt_field(&NAME_FIELD, console)?,
            };
            DomainInput { domain, name }
        } else {
            match (domain, name) {
                (Some(domain), Some(name)) => DomainInput { domain, name },
                _ => {
                    console.write_out(SKIPPED_MESSAGE);
                    return Ok(SeedOutcome::Skipped);
                }
            }
        };

        let created = self.domains.create(&input).await?;
        info!(stage = "seed", domain_id = created.id, domain = %created, "domain created");
        if verbosity >= 1 {
            console.write_out(CREATED_MESSAGE);
        }
        Ok(SeedOutcome::Created(created))
    }

    async fn prompt_domain<C: Console>(&self, console: &mut C) -> Result<String, SeedError> {
        let message = format!("{}: ", DOMAIN_FIELD.label());
        loop {
            let Some(value) = console.prompt(&message)? else {
                return Err(SeedError::Cancelled);
            };
            if self.accept_domain(&value, console).await? {
                return Ok(value);
            }
        }
    }

    /// Cleans a candidate domain and checks it is not taken, reporting why
    /// it was refused.
    async fn accept_domain<C: Console>(
        &self,
        value: &str,
        console: &mut C,
    ) -> Result<bool, SeedError> {
        if !accept_field(&DOMAIN_FIELD, value, console) {
            return Ok(false);
        }
        match self.domains.fetch_by_natural_key(value).await {
            Ok(_) => {
                console.write_err(IN_USE_MESSAGE);
                Ok(false)
            }
            Err(err) if err.is_not_found() => Ok(true),
            Err(err) => Err(SeedError::Storage(err)),
        }
    }
}

fn prompt_field<C: Console>(field: &FieldSpec, console: &mut C) -> Result<String, SeedError> {
    let message = format!("{}: ", field.label());
    loop {
        let Some(value) = console.prompt(&message)? else {
            return Err(SeedError::Cancelled);
        };
        if accept_field(field, &value, console) {
            return Ok(value);
        }
    }
}

fn accept_field<C: Console>(field: &FieldSpec, value: &str, console: &mut C) -> bool {
    match clean_char_field(field, value) {
        Ok(()) => true,
        Err(err) => {
            console.write_err(&format!("Error: {}", err.messages.join("; ")));
            false
        }
    }
}
