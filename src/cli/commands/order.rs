//! `creq order` command - Order management

use chrono::{Local, NaiveDateTime};
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::commands::utils::{list_format, open_workspace, print_sync_status, write_output};
use crate::cli::helpers::{markdown_table, or_dash, truncate_str, write_csv};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::reference;
use crate::core::{OrderDetails, OrderFilter, StoreError};
use crate::entities::{same_text, NewOrder, NewOrderLine, OrderStatus, ReferenceItem};

#[derive(Subcommand, Debug)]
pub enum OrderCommands {
    /// Record a new order
    New(NewArgs),

    /// List orders
    List(ListArgs),

    /// Show an order with its items
    Show(ShowArgs),

    /// Change the status of an order
    Status(StatusArgs),

    /// Export a printable requisition slip (markdown)
    Export(ExportArgs),
}

/// A reference row id with an optional quantity (`ID` or `ID:QTY`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSpec {
    pub id: usize,
    pub quantity: Option<u32>,
}

impl std::str::FromStr for ItemSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (id, qty) = match s.split_once(':') {
            Some((id, qty)) => (id, Some(qty)),
            None => (s, None),
        };
        let id = id
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("invalid reference id '{}'", id.trim()))?;
        let quantity = qty
            .map(|q| {
                q.trim()
                    .parse::<u32>()
                    .map_err(|_| format!("invalid quantity '{}'", q.trim()))
            })
            .transpose()?;
        Ok(Self { id, quantity })
    }
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Client (must exist in the reference spreadsheet)
    #[arg(long, short = 'c')]
    pub client: String,

    /// Rack of the client
    #[arg(long, short = 'r')]
    pub rack: String,

    /// Location inside the rack
    #[arg(long, short = 'l')]
    pub location: String,

    /// Person requesting the cables (default: configured author)
    #[arg(long)]
    pub requester: Option<String>,

    /// Free-text notes
    #[arg(long, short = 'n')]
    pub notes: Option<String>,

    /// Quantity for items given without one
    #[arg(long, default_value_t = 1)]
    pub qty: u32,

    /// Reference row to order, as ID or ID:QTY (repeatable).
    /// Without any, the row at the given location is ordered.
    #[arg(long = "item", value_name = "ID[:QTY]")]
    pub items: Vec<ItemSpec>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Order number contains (case-insensitive)
    #[arg(long)]
    pub number: Option<String>,

    /// Client contains (case-insensitive)
    #[arg(long, short = 'c')]
    pub client: Option<String>,

    /// Exact status
    #[arg(long, short = 's')]
    pub status: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Order number (e.g. REQ-001)
    pub number: String,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Order number (e.g. REQ-001)
    pub number: String,

    /// New status: Pendente, "Em Processamento", Concluído
    pub status: String,

    /// Person responsible for the change (default: configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Order number (e.g. REQ-001)
    pub number: String,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(cmd: OrderCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        OrderCommands::New(args) => run_new(args, global),
        OrderCommands::List(args) => run_list(args, global),
        OrderCommands::Show(args) => run_show(args, global),
        OrderCommands::Status(args) => run_status(args, global),
        OrderCommands::Export(args) => run_export(args, global),
    }
}

/// Turn the requested items into order lines, checked against the reference
fn build_lines(
    items: &[ReferenceItem],
    client: &str,
    rack: &str,
    location: &str,
    specs: &[ItemSpec],
    default_qty: u32,
) -> Result<Vec<NewOrderLine>> {
    if specs.is_empty() {
        let item = reference::find_location(items, client, rack, location).ok_or_else(|| {
            miette::miette!(
                "No reference row at location '{}' of rack '{}' ({})",
                location,
                rack,
                client
            )
        })?;
        return Ok(vec![NewOrderLine::from_reference(item, default_qty)]);
    }

    specs
        .iter()
        .map(|spec| {
            let item = reference::find_by_id(items, spec.id)
                .ok_or_else(|| miette::miette!("Reference row {} not found", spec.id))?;
            if !item.is_in_rack(client, rack) {
                return Err(miette::miette!(
                    "Reference row {} belongs to rack '{}' ({}), not '{}' ({})",
                    spec.id,
                    item.rack,
                    item.cliente,
                    rack,
                    client
                ));
            }
            Ok(NewOrderLine::from_reference(
                item,
                spec.quantity.unwrap_or(default_qty),
            ))
        })
        .collect()
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut workspace = open_workspace(global)?;
    let items = workspace
        .references()
        .map_err(|e| miette::miette!("{}", e))?;

    let client = args.client.trim();
    let rack = args.rack.trim();
    let location = args.location.trim();

    // Keep the reference spelling of client and rack
    let first = reference::filter(&items, Some(client), Some(rack))
        .into_iter()
        .next()
        .ok_or_else(|| {
            miette::miette!(
                help = "see `creq ref racks --client <CLIENT>`",
                "Rack '{}' of client '{}' is not in the reference spreadsheet",
                rack,
                client
            )
        })?;
    let (client, rack) = (first.cliente.clone(), first.rack.clone());

    let location = reference::locations(&items, &client, &rack)
        .into_iter()
        .find(|l| same_text(l, location))
        .map(str::to_string)
        .ok_or_else(|| {
            miette::miette!(
                help = "see `creq ref locations --client <CLIENT> --rack <RACK>`",
                "Location '{}' does not exist in rack '{}'",
                location,
                rack
            )
        })?;

    let lines = build_lines(&items, &client, &rack, &location, &args.items, args.qty)?;

    let order = NewOrder {
        created: Local::now().naive_local(),
        client,
        rack,
        location,
        requester: args
            .requester
            .map(|r| r.trim().to_string())
            .unwrap_or_else(|| workspace.config().author()),
        notes: args
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        lines,
    };
    order.validate().map_err(StoreError::from)?;

    let store = workspace.order_store();
    let saved = store.save_order(&order)?;

    match global.format {
        OutputFormat::Id => println!("{}", saved.order_number),
        _ => {
            println!(
                "{} Created order {} ({} item(s))",
                style("✓").green(),
                style(&saved.order_number).cyan(),
                order.lines.len()
            );
            if !global.quiet {
                println!("   {}", style(store.path().display()).dim());
            }
        }
    }
    print_sync_status(&saved.sync, global.quiet);

    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = workspace.order_store();

    // Accept any casing of a known label, otherwise match the text as given
    let status = args.status.map(|s| match s.parse::<OrderStatus>() {
        Ok(status) => status.to_string(),
        Err(_) => s,
    });
    let filter = OrderFilter {
        number: args.number,
        client: args.client,
        status,
    };
    let orders = store.find_orders(&filter)?;

    if orders.is_empty() {
        if !global.quiet {
            println!("No orders found.");
        }
        return Ok(());
    }

    match list_format(global) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&orders).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&orders).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            write_csv(&orders, std::io::stdout())?;
        }
        OutputFormat::Id => {
            for order in &orders {
                println!("{}", order.number);
            }
        }
        OutputFormat::Md => {
            let table = markdown_table(
                &["Number", "Date", "Client", "Rack", "Location", "Requester", "Status"],
                orders.iter().map(|o| {
                    vec![
                        o.number.clone(),
                        o.created.clone(),
                        o.client.clone(),
                        o.rack.clone(),
                        o.location.clone(),
                        o.requester.clone(),
                        o.status.clone(),
                    ]
                }),
            );
            println!("{}", table);
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            println!(
                "{:<9} {:<17} {:<14} {:<10} {:<10} {:<16} {}",
                style("NUMBER").bold().dim(),
                style("DATE").bold(),
                style("CLIENT").bold(),
                style("RACK").bold(),
                style("LOCATION").bold(),
                style("REQUESTER").bold(),
                style("STATUS").bold()
            );
            for order in &orders {
                println!(
                    "{:<9} {:<17} {:<14} {:<10} {:<10} {:<16} {}",
                    style(&order.number).cyan(),
                    order.created,
                    truncate_str(&order.client, 14),
                    truncate_str(&order.rack, 10),
                    truncate_str(or_dash(&order.location), 10),
                    truncate_str(&order.requester, 16),
                    style_status(&order.status)
                );
            }
            if !global.quiet {
                println!();
                println!("{} order(s) found", style(orders.len()).cyan());
            }
        }
    }

    Ok(())
}

fn style_status(status: &str) -> console::StyledObject<&str> {
    match status.parse::<OrderStatus>() {
        Ok(OrderStatus::Completed) => style(status).green(),
        Ok(OrderStatus::InProcessing) | Ok(OrderStatus::InPreparation) => style(status).yellow(),
        Ok(OrderStatus::Pending) => style(status).cyan(),
        _ => style(status).dim(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let details = workspace
        .order_store()
        .get_order_details(args.number.trim())?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&details).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&details).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            write_csv(&details.lines, std::io::stdout())?;
        }
        OutputFormat::Id => {
            println!("{}", details.info.number);
        }
        OutputFormat::Md => {
            print!("{}", render_slip(&details, Local::now().naive_local()));
        }
        OutputFormat::Auto | OutputFormat::Tsv => print_details(&details),
    }

    Ok(())
}

fn print_details(details: &OrderDetails) {
    let info = &details.info;
    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("Order").bold(), style(&info.number).cyan());
    println!("{}: {}", style("Date").bold(), info.created);
    println!("{}: {}", style("Status").bold(), style_status(&details.status));
    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("Client").bold(), info.client);
    println!("{}: {}", style("Rack").bold(), info.rack);
    println!("{}: {}", style("Location").bold(), or_dash(&info.location));
    println!("{}: {}", style("Requester").bold(), info.requester);
    if !info.notes.trim().is_empty() {
        println!("{}: {}", style("Notes").bold(), info.notes);
    }
    if !info.last_update.is_empty() {
        println!(
            "{}: {} by {}",
            style("Updated").bold(),
            info.last_update,
            or_dash(&info.updated_by)
        );
    }
    println!("{}", style("─".repeat(60)).dim());

    if details.lines.is_empty() {
        println!("{}", style("No items recorded for this order").dim());
        return;
    }
    println!(
        "{:<12} {:<14} {:<8} {:<8} {}",
        style("YAZAKI").bold(),
        style("CABLE").bold(),
        style("SECTION").bold(),
        style("COLOR").bold(),
        style("QTY").bold()
    );
    for line in &details.lines {
        println!(
            "{:<12} {:<14} {:<8} {:<8} {}",
            line.cod_yazaki, line.codigo_cabo, line.seccao, line.cor, line.quantity
        );
    }
}

/// Printable requisition slip with signature lines
pub fn render_slip(details: &OrderDetails, printed_at: NaiveDateTime) -> String {
    let info = &details.info;
    let mut out = String::new();

    out.push_str(&format!("# Pedido de Requisição {}\n\n", info.number));
    out.push_str(&markdown_table(
        &["Campo", "Valor"],
        [
            ("Data", info.created.as_str()),
            ("Status", details.status.as_str()),
            ("Cliente", info.client.as_str()),
            ("RACK", info.rack.as_str()),
            ("Localização", or_dash(&info.location)),
            ("Solicitante", info.requester.as_str()),
            ("Observações", or_dash(&info.notes)),
        ]
        .into_iter()
        .map(|(k, v)| vec![k.to_string(), v.to_string()]),
    ));
    out.push_str("\n\n## Itens\n\n");
    out.push_str(&markdown_table(
        &["#", "CÓD Yazaki", "Código Cabo", "Secção", "Cor", "Quantidade"],
        details.lines.iter().enumerate().map(|(idx, line)| {
            vec![
                (idx + 1).to_string(),
                line.cod_yazaki.clone(),
                line.codigo_cabo.clone(),
                line.seccao.clone(),
                line.cor.clone(),
                line.quantity.to_string(),
            ]
        }),
    ));

    let total: u64 = details.lines.iter().map(|l| u64::from(l.quantity)).sum();
    out.push_str(&format!("\n\n**Total:** {}\n\n", total));
    out.push_str("Solicitante: _____________________________\n\n");
    out.push_str("Aprovação: _______________________________\n\n");
    out.push_str(&format!(
        "Impresso em: {}\n",
        printed_at.format("%d/%m/%Y %H:%M:%S")
    ));
    out
}

fn run_status(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let status: OrderStatus = args.status.parse().map_err(|e| {
        let labels: Vec<_> = OrderStatus::current().iter().map(|s| s.as_str()).collect();
        miette::miette!(help = format!("use one of: {}", labels.join(", ")), "{}", e)
    })?;

    let workspace = open_workspace(global)?;
    let responsible = args
        .by
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| workspace.config().author());

    let number = args.number.trim();
    workspace
        .order_store()
        .update_status(number, status.as_str(), &responsible)?;

    if !global.quiet {
        println!(
            "{} {} is now {} (by {})",
            style("✓").green(),
            style(number).cyan(),
            style_status(status.as_str()),
            responsible
        );
    }
    Ok(())
}

fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let details = workspace
        .order_store()
        .get_order_details(args.number.trim())?;
    let slip = render_slip(&details, Local::now().naive_local());
    write_output(&slip, args.output.as_deref())
}
