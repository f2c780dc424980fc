//! # CLI Layer
//!
//! The terminal client for dealerlot. It is the only place that:
//! - parses shell arguments
//! - prints to stdout/stderr
//! - installs the tracing subscriber
//!
//! Each `handle_*` turns typed arguments into `DealerApi` calls and hands the
//! returned `CmdResult` to the printers in `print.rs`. Business rules live in the
//! library; handlers only resolve display indexes and loop over them.

use super::print::{
    print_auction_roi, print_backups, print_config, print_draft, print_drafts, print_loan,
    print_messages, print_metrics, print_paths, print_vehicle_list, print_vehicles_full,
};
use super::setup::{
    print_grouped_help, print_help_for_command, subcommand_name, BackupAction, Cli, Commands,
    DataCommands, DeskCommands, DraftAction, InventoryCommands, MiscCommands, VehicleArgs,
    VehicleCommands,
};
use clap::Parser;
use dealerlot::api::{ConfigAction, DealerApi, SortOrder, VehicleFilter};
use dealerlot::commands::export::default_filename;
use dealerlot::commands::{CmdResult, DealerPaths};
use dealerlot::config::DealerConfig;
use dealerlot::error::{DealerError, Result};
use dealerlot::finance::{auction_roi, quote_loan, AuctionCosts};
use dealerlot::model::{VehicleInput, VehicleStatus};
use dealerlot::store::fs_backend::FsBackend;
use dealerlot::store::FileStore;
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const HOME_ENV: &str = "DEALERLOT_HOME";

struct AppContext {
    api: DealerApi<FileStore>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.help {
        match &cli.command {
            None => print_grouped_help(),
            Some(cmd) => print_help_for_command(subcommand_name(cmd)),
        }
        return Ok(());
    }

    // These need no inventory
    match &cli.command {
        Some(Commands::Misc(MiscCommands::Help { command })) => {
            return handle_help(command.clone())
        }
        Some(Commands::Desk(cmd @ DeskCommands::Roi { .. })) => return handle_roi(cmd),
        Some(Commands::Desk(DeskCommands::Loan {
            vehicle: None,
            price: Some(price),
            down,
            apr,
            months,
        })) => return handle_loan(*price, *down, *apr, *months),
        _ => {}
    }

    let mut ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::Inventory(cmd)) => match cmd {
            InventoryCommands::Add {
                from_draft,
                vehicle,
            } => handle_add(&mut ctx, vehicle, from_draft),
            InventoryCommands::List {
                search,
                status,
                make,
                fuel_type,
                min_price,
                max_price,
                min_year,
                max_year,
                favorites,
                featured,
                deleted,
                sort,
            } => {
                let filter = VehicleFilter {
                    status,
                    make,
                    fuel_type,
                    min_price,
                    max_price,
                    min_year,
                    max_year,
                    search,
                    favorites_only: favorites,
                    featured_only: featured,
                    deleted,
                };
                handle_list(&mut ctx, filter, sort)
            }
            InventoryCommands::Metrics => handle_metrics(&mut ctx),
            InventoryCommands::Draft { action } => handle_draft(&mut ctx, action),
        },
        Some(Commands::Vehicle(cmd)) => match cmd {
            VehicleCommands::View { indexes } => handle_view(&mut ctx, indexes),
            VehicleCommands::Edit { index, vehicle } => handle_edit(&mut ctx, index, vehicle),
            VehicleCommands::Delete { indexes } => {
                for_each_vehicle(&mut ctx, &indexes, |api, id| api.delete_vehicle(id))
            }
            VehicleCommands::Restore { indexes } => {
                for_each_vehicle(&mut ctx, &indexes, |api, id| api.restore_vehicle(id))
            }
            VehicleCommands::Favorite { indexes } => {
                for_each_vehicle(&mut ctx, &indexes, |api, id| api.toggle_favorite(id))
            }
            VehicleCommands::Feature { indexes } => {
                for_each_vehicle(&mut ctx, &indexes, |api, id| api.toggle_featured(id))
            }
            VehicleCommands::Status { status, indexes } => handle_status(&mut ctx, status, indexes),
            VehicleCommands::BumpViews { indexes } => {
                for_each_vehicle(&mut ctx, &indexes, |api, id| api.increment_views(id))
            }
        },
        Some(Commands::Data(cmd)) => match cmd {
            DataCommands::Backups { action } => handle_backups(&mut ctx, action),
            DataCommands::Export { output } => handle_export(&mut ctx, output),
            DataCommands::Import { path } => handle_import(&mut ctx, path),
            DataCommands::Doctor => handle_doctor(&mut ctx),
        },
        Some(Commands::Desk(cmd)) => match cmd {
            DeskCommands::Loan {
                vehicle,
                price,
                down,
                apr,
                months,
            } => handle_vehicle_loan(&mut ctx, vehicle, price, down, apr, months),
            roi @ DeskCommands::Roi { .. } => handle_roi(&roi),
        },
        Some(Commands::Misc(cmd)) => match cmd {
            MiscCommands::Config { key, value } => handle_config(&mut ctx, key, value),
            MiscCommands::Help { command } => handle_help(command),
        },
        None => handle_list(&mut ctx, VehicleFilter::default(), SortOrder::default()),
    }
}

/// Diagnostics go to stderr so they never mix with command output.
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn data_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(dir.clone());
    }
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "dealerlot", "dealerlot")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| DealerError::Config("Could not determine data directory".to_string()))
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let dir = data_dir(cli)?;
    debug!(dir = %dir.display(), "using data directory");

    let config = DealerConfig::load(&dir)?;
    let store = FileStore::with_backend(FsBackend::new(dir.clone()))
        .with_storage_key(&config.storage_key)
        .with_backup_retention(config.backup_retention);
    let api = DealerApi::open(store, config, DealerPaths { data: dir })?;
    Ok(AppContext { api })
}

/// Resolves every index up front so a typo fails before anything is written,
/// then applies `op` to each vehicle in order.
fn for_each_vehicle<F>(ctx: &mut AppContext, indexes: &[String], mut op: F) -> Result<()>
where
    F: FnMut(&mut DealerApi<FileStore>, &uuid::Uuid) -> Result<CmdResult>,
{
    let ids = ctx.api.resolve_ids(indexes)?;
    let mut result = CmdResult::default();
    for id in &ids {
        result.extend(op(&mut ctx.api, id)?);
    }
    print_messages(&result.messages);
    Ok(())
}

/// Lays the fields given on the command line over `base`.
fn overlay(base: VehicleInput, patch: VehicleInput) -> Result<VehicleInput> {
    let mut merged = serde_json::to_value(base)?;
    if let (Some(target), serde_json::Value::Object(fields)) =
        (merged.as_object_mut(), serde_json::to_value(patch)?)
    {
        target.extend(fields);
    }
    Ok(serde_json::from_value(merged)?)
}

fn handle_add(ctx: &mut AppContext, vehicle: VehicleArgs, from_draft: bool) -> Result<()> {
    let fields = vehicle.into_input()?;
    let input = if from_draft {
        let draft = ctx
            .api
            .draft()
            .cloned()
            .ok_or_else(|| DealerError::Api("No draft in progress".to_string()))?;
        overlay(draft, fields)?
    } else {
        fields
    };

    let result = ctx.api.add_vehicle(input)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_list(ctx: &mut AppContext, filter: VehicleFilter, sort: SortOrder) -> Result<()> {
    let result = ctx.api.list_vehicles(&filter, sort);
    print_vehicle_list(&result.listed_vehicles);
    print_messages(&result.messages);
    Ok(())
}

fn handle_metrics(ctx: &mut AppContext) -> Result<()> {
    let result = ctx.api.metrics();
    if let Some(metrics) = &result.metrics {
        print_metrics(metrics);
    }
    Ok(())
}

fn handle_view(ctx: &mut AppContext, indexes: Vec<String>) -> Result<()> {
    let listed = ctx.api.resolve(&indexes)?;
    print_vehicles_full(&listed);
    Ok(())
}

fn handle_edit(ctx: &mut AppContext, index: String, vehicle: VehicleArgs) -> Result<()> {
    let input = vehicle.into_input()?;
    if input.is_empty() {
        return Err(DealerError::Api(
            "Nothing to change: pass at least one field, e.g. --price 18500".to_string(),
        ));
    }
    let ids = ctx.api.resolve_ids(&[index])?;
    let mut result = CmdResult::default();
    for id in &ids {
        result.extend(ctx.api.update_vehicle(id, input.clone())?);
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_status(ctx: &mut AppContext, status: VehicleStatus, indexes: Vec<String>) -> Result<()> {
    for_each_vehicle(ctx, &indexes, |api, id| api.update_status(id, status))
}

fn handle_draft(ctx: &mut AppContext, action: DraftAction) -> Result<()> {
    let listing = matches!(action, DraftAction::List);
    let result = match action {
        DraftAction::Show => ctx.api.show_draft(),
        DraftAction::Save { vehicle } => ctx.api.save_draft(vehicle.into_input()?)?,
        DraftAction::Clear => ctx.api.clear_draft()?,
        DraftAction::List => ctx.api.list_drafts(),
        DraftAction::Stash { name, vehicle } => {
            let fields = vehicle.into_input()?;
            let input = if fields.is_empty() {
                ctx.api.draft().cloned().ok_or_else(|| {
                    DealerError::Api("No draft in progress and no fields given".to_string())
                })?
            } else {
                fields
            };
            ctx.api.save_draft_to_list(input, name)?
        }
        DraftAction::Load { draft } => {
            let id = ctx.api.resolve_draft(&draft)?;
            ctx.api.load_draft_from_list(&id)?
        }
        DraftAction::Drop { draft } => {
            let id = ctx.api.resolve_draft(&draft)?;
            ctx.api.delete_draft_from_list(&id)?
        }
    };

    if let Some(draft) = &result.draft {
        print_draft(draft);
    }
    if listing {
        print_drafts(&result.drafts);
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_backups(ctx: &mut AppContext, action: BackupAction) -> Result<()> {
    let result = match action {
        BackupAction::List => ctx.api.list_backups()?,
        BackupAction::Prune => ctx.api.prune_backups()?,
        BackupAction::Restore { backup } => ctx.api.restore_backup(backup.as_deref())?,
    };
    print_backups(&result.backups);
    print_messages(&result.messages);
    Ok(())
}

fn handle_export(ctx: &mut AppContext, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| default_filename(chrono::Utc::now()));
    let result = ctx.api.export(&output)?;
    print_messages(&result.messages);
    print_paths(&result.paths);
    Ok(())
}

fn handle_import(ctx: &mut AppContext, path: PathBuf) -> Result<()> {
    let result = ctx.api.import(&path)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_doctor(ctx: &mut AppContext) -> Result<()> {
    let result = ctx.api.doctor()?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_config(ctx: &mut AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };
    let show_all = matches!(action, ConfigAction::ShowAll);

    let result = ctx.api.config(action)?;
    if show_all {
        if let Some(config) = &result.config {
            print_config(config);
        }
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_loan(price: f64, down: f64, apr: f64, months: u32) -> Result<()> {
    let quote = quote_loan(price, down, apr, months)?;
    print_loan(&quote);
    Ok(())
}

fn handle_vehicle_loan(
    ctx: &mut AppContext,
    vehicle: Option<String>,
    price: Option<f64>,
    down: f64,
    apr: f64,
    months: u32,
) -> Result<()> {
    let price = match (vehicle, price) {
        (Some(index), _) => {
            let listed = ctx.api.resolve(&[index])?;
            let dv = listed
                .first()
                .ok_or_else(|| DealerError::Api("No vehicle selected".to_string()))?;
            println!("{}", dv.vehicle.title);
            dv.vehicle.price
        }
        (None, Some(price)) => price,
        (None, None) => return Err(DealerError::Api("Pass --price or --vehicle".to_string())),
    };
    handle_loan(price, down, apr, months)
}

fn handle_roi(cmd: &DeskCommands) -> Result<()> {
    if let DeskCommands::Roi {
        hammer,
        fee,
        transport,
        recon,
        sale,
    } = cmd
    {
        let costs = AuctionCosts {
            hammer_price: *hammer,
            buyer_fee: *fee,
            transport: *transport,
            reconditioning: *recon,
            expected_sale_price: *sale,
        };
        print_auction_roi(&costs, &auction_roi(&costs));
    }
    Ok(())
}

fn handle_help(command: Option<String>) -> Result<()> {
    match command {
        None => print_grouped_help(),
        Some(cmd) => print_help_for_command(&cmd),
    }
    Ok(())
}
