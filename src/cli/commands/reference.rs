//! `creq ref` command - Browse the reference spreadsheet

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{list_format, open_workspace};
use crate::cli::helpers::{markdown_table, or_dash, truncate_str, write_csv};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::reference;
use crate::entities::ReferenceItem;

#[derive(Subcommand, Debug)]
pub enum RefCommands {
    /// List reference rows
    List(ListArgs),

    /// List clients
    Clients,

    /// List the racks of a client
    Racks(RacksArgs),

    /// List the locations of a client's rack
    Locations(LocationsArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only rows of this client (case-insensitive)
    #[arg(long, short = 'c')]
    pub client: Option<String>,

    /// Only rows of this rack (case-insensitive)
    #[arg(long, short = 'r')]
    pub rack: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RacksArgs {
    #[arg(long, short = 'c')]
    pub client: String,
}

#[derive(clap::Args, Debug)]
pub struct LocationsArgs {
    #[arg(long, short = 'c')]
    pub client: String,

    #[arg(long, short = 'r')]
    pub rack: String,
}

/// Flat CSV record; every column present even when empty
#[derive(serde::Serialize)]
struct CsvRow<'a> {
    id: usize,
    cliente: &'a str,
    rack: &'a str,
    locacao: &'a str,
    cod_yazaki: &'a str,
    codigo_cabo: &'a str,
    seccao: &'a str,
    cor: &'a str,
    projeto: &'a str,
    cod_oes: &'a str,
}

impl<'a> From<&'a ReferenceItem> for CsvRow<'a> {
    fn from(i: &'a ReferenceItem) -> Self {
        Self {
            id: i.id,
            cliente: &i.cliente,
            rack: &i.rack,
            locacao: &i.locacao,
            cod_yazaki: &i.cod_yazaki,
            codigo_cabo: &i.codigo_cabo,
            seccao: &i.seccao,
            cor: &i.cor,
            projeto: i.projeto.as_deref().unwrap_or(""),
            cod_oes: i.cod_oes.as_deref().unwrap_or(""),
        }
    }
}

pub fn run(cmd: RefCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RefCommands::List(args) => run_list(args, global),
        RefCommands::Clients => run_clients(global),
        RefCommands::Racks(args) => run_racks(args, global),
        RefCommands::Locations(args) => run_locations(args, global),
    }
}

fn load(global: &GlobalOpts) -> Result<std::sync::Arc<Vec<ReferenceItem>>> {
    let mut workspace = open_workspace(global)?;
    workspace
        .references()
        .map_err(|e| miette::miette!("{}", e))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let items = load(global)?;
    let rows = reference::filter(&items, args.client.as_deref(), args.rack.as_deref());

    if rows.is_empty() {
        if !global.quiet {
            println!("No reference rows found.");
        }
        return Ok(());
    }

    match list_format(global) {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&rows).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&rows).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            let records: Vec<CsvRow> = rows.iter().map(|i| CsvRow::from(*i)).collect();
            write_csv(&records, std::io::stdout())?;
        }
        OutputFormat::Id => {
            for item in &rows {
                println!("{}", item.id);
            }
        }
        OutputFormat::Md => {
            let table = markdown_table(
                &["ID", "Client", "Rack", "Location", "Cód Yazaki", "Cable", "Section", "Color"],
                rows.iter().map(|i| {
                    vec![
                        i.id.to_string(),
                        i.cliente.clone(),
                        i.rack.clone(),
                        i.locacao.clone(),
                        i.cod_yazaki.clone(),
                        i.codigo_cabo.clone(),
                        i.seccao.clone(),
                        i.cor.clone(),
                    ]
                }),
            );
            println!("{}", table);
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            println!(
                "{:<5} {:<14} {:<10} {:<10} {:<12} {:<14} {:<8} {}",
                style("ID").bold().dim(),
                style("CLIENT").bold(),
                style("RACK").bold(),
                style("LOCATION").bold(),
                style("YAZAKI").bold(),
                style("CABLE").bold(),
                style("SECTION").bold(),
                style("COLOR").bold()
            );
            for item in &rows {
                println!(
                    "{:<5} {:<14} {:<10} {:<10} {:<12} {:<14} {:<8} {}",
                    style(item.id).cyan(),
                    truncate_str(&item.cliente, 14),
                    truncate_str(&item.rack, 10),
                    truncate_str(or_dash(&item.locacao), 10),
                    truncate_str(&item.cod_yazaki, 12),
                    truncate_str(&item.codigo_cabo, 14),
                    truncate_str(&item.seccao, 8),
                    item.cor
                );
            }
            if !global.quiet {
                println!();
                println!("{} reference row(s)", style(rows.len()).cyan());
            }
        }
    }

    Ok(())
}

fn print_values<S: AsRef<str> + serde::Serialize>(values: &[S], global: &GlobalOpts, empty: &str) -> Result<()> {
    if values.is_empty() {
        if !global.quiet {
            println!("{}", empty);
        }
        return Ok(());
    }

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(values).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(values).into_diagnostic()?);
        }
        _ => {
            for value in values {
                println!("{}", value.as_ref());
            }
        }
    }
    Ok(())
}

fn run_clients(global: &GlobalOpts) -> Result<()> {
    let items = load(global)?;
    print_values(&reference::clients(&items), global, "No clients found.")
}

fn run_racks(args: RacksArgs, global: &GlobalOpts) -> Result<()> {
    let items = load(global)?;
    print_values(
        &reference::racks(&items, args.client.trim()),
        global,
        "No racks found for this client.",
    )
}

fn run_locations(args: LocationsArgs, global: &GlobalOpts) -> Result<()> {
    let items = load(global)?;
    let locations: Vec<&str> = reference::locations(&items, args.client.trim(), args.rack.trim())
        .into_iter()
        .filter(|l| !l.is_empty())
        .collect();
    print_values(&locations, global, "No locations found for this rack.")
}
