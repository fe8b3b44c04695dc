//! Line-oriented command shell over a [`Session`].
//!
//! Each input line is parsed as one command. Failures of a command, including
//! an unreachable database, are printed and the shell keeps going; only
//! `exit` or end of input ends it.

use std::io::{self, BufRead, Write};

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::models::{HarvestMethod, NewHarvest};
use crate::render;
use crate::session::{DeleteTarget, Session};
use crate::store::Connector;

const PROMPT: &str = "cane> ";

#[derive(Debug, Parser)]
#[command(name = "cane", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum ShellCommand {
    /// Register a harvest: area (ha), yield (t/ha), method, price per ton, plot name
    Register {
        #[arg(value_parser = parse_positive)]
        area_ha: f64,
        #[arg(value_parser = parse_positive)]
        yield_t_per_ha: f64,
        method: HarvestMethod,
        #[arg(value_parser = parse_non_negative)]
        price_per_ton: f64,
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        plot: Vec<String>,
    },
    /// List the records in the ledger
    List,
    /// Show production and loss totals
    Summary,
    /// Save the ledger to the JSON document
    Save {
        /// Overwrite the document even if it could not be loaded
        #[arg(long)]
        force: bool,
    },
    /// Replace the ledger with the JSON document
    Load,
    /// Remove a record from the ledger by its 1-based position
    Delete { position: usize },
    /// Create the COLHEITAS table
    DbCreate,
    /// Upsert every ledger record into the table
    DbExport,
    /// Show every row of the table
    DbQuery,
    /// List stored rows newest first, numbered for db-delete
    DbIds,
    /// Delete one stored row by id or by db-ids position
    DbDelete { target: DeleteTarget },
    /// Delete every stored row
    DbDeleteAll,
    /// Replace the ledger with the table contents
    DbImport,
    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Accepts a decimal comma as well as a point.
fn parse_number(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite number", s));
    }
    Ok(value)
}

fn parse_positive(s: &str) -> std::result::Result<f64, String> {
    let value = parse_number(s)?;
    if value <= 0.0 {
        return Err(format!("value must be greater than zero, got {}", value));
    }
    Ok(value)
}

fn parse_non_negative(s: &str) -> std::result::Result<f64, String> {
    let value = parse_number(s)?;
    if value < 0.0 {
        return Err(format!("value must not be negative, got {}", value));
    }
    Ok(value)
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> std::result::Result<Option<ShellCommand>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    ShellLine::try_parse_from(words).map(|parsed| Some(parsed.command))
}

/// Run one command and write its outcome to `out`.
pub fn execute<C: Connector>(
    session: &mut Session<C>,
    command: ShellCommand,
    out: &mut impl Write,
) -> io::Result<Flow> {
    if command == ShellCommand::Exit {
        return Ok(Flow::Exit);
    }

    match apply(session, command) {
        Ok(message) => write!(out, "{}", message)?,
        Err(e) => {
            tracing::debug!("Command failed: {}", e);
            writeln!(out, "error: {}", e)?;
        }
    }
    Ok(Flow::Continue)
}

fn apply<C: Connector>(session: &mut Session<C>, command: ShellCommand) -> Result<String> {
    let message = match command {
        ShellCommand::Register {
            area_ha,
            yield_t_per_ha,
            method,
            price_per_ton,
            plot,
        } => {
            let record = session.register(NewHarvest {
                plot_name: plot.join(" "),
                area_ha,
                yield_t_per_ha,
                method,
                price_per_ton,
            })?;
            format!(
                "Registered {}: {:.2} t harvested, {:.2} t lost ({:.2}%), loss cost {}\n",
                record.plot_name(),
                record.total_tons(),
                record.loss_tons(),
                record.loss_pct(),
                render::format_currency(record.loss_cost())
            )
        }
        ShellCommand::List => render::render_ledger(session.ledger().records()),
        ShellCommand::Summary => render::render_summary(&session.summary()),
        ShellCommand::Save { force } => {
            let count = if force {
                session.overwrite_file()?
            } else {
                session.save_file()?
            };
            format!(
                "Saved {} record(s) to {}\n",
                count,
                session.file_store().path().display()
            )
        }
        ShellCommand::Load => {
            let count = session.load_file()?;
            format!("Loaded {} record(s).\n", count)
        }
        ShellCommand::Delete { position } => {
            let removed = session.remove_local(position)?;
            format!("Removed record #{} ({}).\n", position, removed.plot_name())
        }
        ShellCommand::DbCreate => format!("{}\n", session.create_table()?),
        ShellCommand::DbExport => format!("{}\n", session.export()?),
        ShellCommand::DbQuery => render::render_rows(&session.query_table()?),
        ShellCommand::DbIds => render::render_identifiers(&session.table_identifiers()?),
        ShellCommand::DbDelete { target } => {
            let removed = session.delete_from_table(target)?;
            format!("{} row(s) removed.\n", removed)
        }
        ShellCommand::DbDeleteAll => format!("{} row(s) removed.\n", session.clear_table()?),
        ShellCommand::DbImport => {
            format!("Imported {} record(s) from table.\n", session.import_table()?)
        }
        ShellCommand::Exit => String::new(),
    };
    Ok(message)
}

/// Read commands from `input` until `exit` or end of input.
pub fn run<C: Connector>(
    session: &mut Session<C>,
    input: impl BufRead,
    out: &mut impl Write,
    interactive: bool,
) -> io::Result<()> {
    let mut lines = input.lines();
    loop {
        if interactive {
            write!(out, "{}", PROMPT)?;
            out.flush()?;
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(command)) => {
                if execute(session, command, out)? == Flow::Exit {
                    break;
                }
            }
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    write!(out, "{}", e.render())?
                }
                _ => writeln!(out, "{}", e.render().to_string().trim_end())?,
            },
        }
    }
    Ok(())
}
