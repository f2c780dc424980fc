use clap::{Args, CommandFactory, Parser, Subcommand};
use dealerlot::api::SortOrder;
use dealerlot::error::{DealerError, Result};
use dealerlot::model::{
    EvIncentives, SpecValue, Specifications, TitleStatus, VehicleInput, VehicleStatus,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dealerlot",
    bin_name = "dealerlot",
    version,
    disable_help_flag = true,
    disable_help_subcommand = true
)]
#[command(about = "Dealership inventory, drafts and sales analytics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (defaults to $DEALERLOT_HOME, then the OS data dir)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Print help
    #[arg(short, long, global = true)]
    pub help: bool,
}

/// Command group definitions for help output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Inventory,
    Vehicle,
    Data,
    Desk,
    Misc,
}

impl CommandGroup {
    pub fn heading(&self) -> &'static str {
        match self {
            CommandGroup::Inventory => "Inventory Commands:",
            CommandGroup::Vehicle => "Per-Vehicle Commands:",
            CommandGroup::Data => "Data Commands:",
            CommandGroup::Desk => "Sales Desk:",
            CommandGroup::Misc => "Miscellaneous:",
        }
    }

    pub fn for_command(name: &str) -> Option<Self> {
        match name {
            "add" | "list" | "metrics" | "draft" => Some(CommandGroup::Inventory),
            "view" | "edit" | "delete" | "restore" | "favorite" | "feature" | "status"
            | "bump-views" => Some(CommandGroup::Vehicle),
            "backups" | "export" | "import" | "doctor" => Some(CommandGroup::Data),
            "loan" | "roi" => Some(CommandGroup::Desk),
            "config" | "help" => Some(CommandGroup::Misc),
            _ => None,
        }
    }

    pub fn all() -> &'static [CommandGroup] {
        &[
            CommandGroup::Inventory,
            CommandGroup::Vehicle,
            CommandGroup::Data,
            CommandGroup::Desk,
            CommandGroup::Misc,
        ]
    }
}

pub fn get_grouped_help() -> String {
    let cmd = Cli::command();
    let version = cmd.get_version().unwrap_or("unknown");

    let mut output = String::new();
    output.push_str(&format!("dealerlot {version}\n"));
    output.push_str("Dealership inventory, drafts and sales analytics\n");
    output.push('\n');
    output.push_str("Usage: dealerlot [OPTIONS] [COMMAND]\n");

    let subcommands: Vec<_> = cmd.get_subcommands().collect();
    for group in CommandGroup::all() {
        let group_cmds: Vec<_> = subcommands
            .iter()
            .filter(|sc| {
                !sc.is_hide_set() && CommandGroup::for_command(sc.get_name()) == Some(*group)
            })
            .collect();

        if !group_cmds.is_empty() {
            output.push('\n');
            output.push_str(&format!("{}\n", group.heading()));
            for sc in group_cmds {
                let name = sc.get_name();
                let about = sc.get_about().map(|s| s.to_string()).unwrap_or_default();
                output.push_str(&format!("  {:<12} {}\n", name, about));
            }
        }
    }

    output.push('\n');
    output.push_str("Options:\n");
    output.push_str("      --data-dir <DIR>  Data directory\n");
    output.push_str("  -v, --verbose         Verbose output\n");
    output.push_str("  -h, --help            Print help\n");
    output.push_str("  -V, --version         Print version\n");
    output
}

pub fn print_grouped_help() {
    print!("{}", get_grouped_help());
}

/// Prints help for a command by name using clap's rendering
pub fn print_help_for_command(name: &str) {
    let mut cmd = Cli::command();
    for subcmd in cmd.get_subcommands_mut() {
        if subcmd.get_name() == name {
            print!("{}", subcmd.render_help());
            return;
        }
    }
    eprintln!("Unknown command: {}", name);
    eprintln!();
    print_grouped_help();
}

pub fn subcommand_name(command: &Commands) -> &'static str {
    match command {
        Commands::Inventory(c) => match c {
            InventoryCommands::Add { .. } => "add",
            InventoryCommands::List { .. } => "list",
            InventoryCommands::Metrics => "metrics",
            InventoryCommands::Draft { .. } => "draft",
        },
        Commands::Vehicle(c) => match c {
            VehicleCommands::View { .. } => "view",
            VehicleCommands::Edit { .. } => "edit",
            VehicleCommands::Delete { .. } => "delete",
            VehicleCommands::Restore { .. } => "restore",
            VehicleCommands::Favorite { .. } => "favorite",
            VehicleCommands::Feature { .. } => "feature",
            VehicleCommands::Status { .. } => "status",
            VehicleCommands::BumpViews { .. } => "bump-views",
        },
        Commands::Data(c) => match c {
            DataCommands::Backups { .. } => "backups",
            DataCommands::Export { .. } => "export",
            DataCommands::Import { .. } => "import",
            DataCommands::Doctor => "doctor",
        },
        Commands::Desk(c) => match c {
            DeskCommands::Loan { .. } => "loan",
            DeskCommands::Roi { .. } => "roi",
        },
        Commands::Misc(c) => match c {
            MiscCommands::Config { .. } => "config",
            MiscCommands::Help { .. } => "help",
        },
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Inventory(InventoryCommands),

    #[command(flatten)]
    Vehicle(VehicleCommands),

    #[command(flatten)]
    Data(DataCommands),

    #[command(flatten)]
    Desk(DeskCommands),

    #[command(flatten)]
    Misc(MiscCommands),
}

/// Vehicle fields shared by `add`, `edit` and the draft commands.
/// Every field is optional; only the ones given are applied.
#[derive(Args, Debug, Default, Clone)]
pub struct VehicleArgs {
    #[arg(long)]
    pub make: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long)]
    pub price: Option<f64>,
    #[arg(long)]
    pub mileage: Option<u32>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub condition: Option<String>,
    #[arg(long)]
    pub transmission: Option<String>,
    #[arg(long = "fuel-type")]
    pub fuel_type: Option<String>,
    #[arg(long = "body-style")]
    pub body_style: Option<String>,
    /// Primary image URL
    #[arg(long)]
    pub image: Option<String>,
    /// Gallery URLs, comma separated (the first becomes the primary image)
    #[arg(long, value_delimiter = ',')]
    pub images: Option<Vec<String>>,
    #[arg(long)]
    pub description: Option<String>,
    /// Feature, repeatable (replaces the whole list on edit)
    #[arg(long = "feature")]
    pub features: Vec<String>,
    /// available, pending or sold
    #[arg(long)]
    pub status: Option<VehicleStatus>,
    /// Clean, Salvage or Rebuilt
    #[arg(long = "title-status")]
    pub title_status: Option<TitleStatus>,
    #[arg(long = "purchase-price")]
    pub purchase_price: Option<f64>,
    #[arg(long = "sold-price")]
    pub sold_price: Option<f64>,
    #[arg(long)]
    pub favorite: Option<bool>,
    #[arg(long)]
    pub featured: Option<bool>,
    /// Specification, repeatable: KEY=VALUE
    #[arg(long = "spec", value_name = "KEY=VALUE")]
    pub specs: Vec<String>,
    #[arg(long = "ev-federal")]
    pub ev_federal: Option<f64>,
    #[arg(long = "ev-state")]
    pub ev_state: Option<f64>,
    #[arg(long = "ev-local")]
    pub ev_local: Option<f64>,
}

impl VehicleArgs {
    pub fn into_input(self) -> Result<VehicleInput> {
        let specifications = if self.specs.is_empty() {
            None
        } else {
            Some(parse_specs(&self.specs)?)
        };
        let ev_incentives = if self.ev_federal.is_some()
            || self.ev_state.is_some()
            || self.ev_local.is_some()
        {
            Some(EvIncentives::new(
                self.ev_federal.unwrap_or(0.0),
                self.ev_state.unwrap_or(0.0),
                self.ev_local.unwrap_or(0.0),
            ))
        } else {
            None
        };

        Ok(VehicleInput {
            title: self.title,
            make: self.make,
            model: self.model,
            year: self.year,
            price: self.price,
            mileage: self.mileage,
            location: self.location,
            condition: self.condition,
            transmission: self.transmission,
            fuel_type: self.fuel_type,
            body_style: self.body_style,
            image: self.image,
            images: self.images,
            description: self.description,
            features: (!self.features.is_empty()).then_some(self.features),
            specifications,
            status: self.status,
            favorites: self.favorite,
            featured: self.featured,
            title_status: self.title_status,
            purchase_price: self.purchase_price,
            sold_price: self.sold_price,
            ev_incentives,
            is_draft: None,
            last_modified: None,
        })
    }
}

fn parse_specs(pairs: &[String]) -> Result<Specifications> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| DealerError::Api(format!("Invalid spec '{}': use KEY=VALUE", pair)))?;
        let value = match value.trim().parse::<f64>() {
            Ok(n) => SpecValue::Number(n),
            Err(_) => SpecValue::Text(value.trim().to_string()),
        };
        map.insert(key.trim().to_string(), value);
    }
    Ok(Specifications::Custom(map))
}

#[derive(Subcommand, Debug)]
pub enum InventoryCommands {
    /// Add a vehicle
    #[command(alias = "n", display_order = 1)]
    Add {
        /// Start from the current draft
        #[arg(long)]
        from_draft: bool,

        #[command(flatten)]
        vehicle: VehicleArgs,
    },

    /// List vehicles
    #[command(alias = "ls", display_order = 2)]
    List {
        /// Search title, make, model and description
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        status: Option<VehicleStatus>,

        #[arg(long)]
        make: Option<String>,

        #[arg(long = "fuel-type")]
        fuel_type: Option<String>,

        #[arg(long)]
        min_price: Option<f64>,

        #[arg(long)]
        max_price: Option<f64>,

        #[arg(long)]
        min_year: Option<i32>,

        #[arg(long)]
        max_year: Option<i32>,

        /// Only favorited vehicles
        #[arg(long)]
        favorites: bool,

        /// Only featured vehicles
        #[arg(long)]
        featured: bool,

        /// Show deleted vehicles
        #[arg(long)]
        deleted: bool,

        /// newest, oldest, price-low, price-high, mileage-low, year-newest, most-viewed
        #[arg(long, default_value = "newest")]
        sort: SortOrder,
    },

    /// Show sales and inventory metrics
    #[command(display_order = 3)]
    Metrics,

    /// Work with the current draft and saved drafts
    #[command(display_order = 4)]
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum DraftAction {
    /// Show the current draft
    Show,
    /// Save fields into the current draft (replaces it)
    Save {
        #[command(flatten)]
        vehicle: VehicleArgs,
    },
    /// Discard the current draft
    Clear,
    /// List saved drafts
    List,
    /// Save a draft to the list (the current draft when no fields are given)
    Stash {
        /// Name for the saved draft
        #[arg(long = "name")]
        name: Option<String>,

        #[command(flatten)]
        vehicle: VehicleArgs,
    },
    /// Copy a saved draft into the current draft
    Load {
        /// Position in `draft list` or draft id
        draft: String,
    },
    /// Remove a saved draft
    Drop {
        /// Position in `draft list` or draft id
        draft: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum VehicleCommands {
    /// View one or more vehicles
    #[command(alias = "v", display_order = 10)]
    View {
        /// Indexes of the vehicles (e.g. 1 f1 d1 2-4)
        #[arg(required = true, num_args = 1..)]
        indexes: Vec<String>,
    },

    /// Edit a vehicle's fields
    #[command(alias = "e", display_order = 11)]
    Edit {
        /// Index of the vehicle
        index: String,

        #[command(flatten)]
        vehicle: VehicleArgs,
    },

    /// Delete one or more vehicles (recoverable with restore)
    #[command(alias = "rm", display_order = 12)]
    Delete {
        #[arg(required = true, num_args = 1..)]
        indexes: Vec<String>,
    },

    /// Restore deleted vehicles
    #[command(display_order = 13)]
    Restore {
        /// Indexes of the deleted vehicles (e.g. d1 d2)
        #[arg(required = true, num_args = 1..)]
        indexes: Vec<String>,
    },

    /// Toggle the favorite flag
    #[command(alias = "fav", display_order = 14)]
    Favorite {
        #[arg(required = true, num_args = 1..)]
        indexes: Vec<String>,
    },

    /// Toggle the featured flag
    #[command(display_order = 15)]
    Feature {
        #[arg(required = true, num_args = 1..)]
        indexes: Vec<String>,
    },

    /// Set the sale status
    #[command(display_order = 16)]
    Status {
        /// available, pending or sold
        status: VehicleStatus,

        #[arg(required = true, num_args = 1..)]
        indexes: Vec<String>,
    },

    /// Record a detail-page view
    #[command(name = "bump-views", display_order = 17)]
    BumpViews {
        #[arg(required = true, num_args = 1..)]
        indexes: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Inspect and use the backup ledger
    #[command(display_order = 20)]
    Backups {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Export everything to a tar.gz archive
    #[command(display_order = 21)]
    Export {
        /// Output file (defaults to dealerlot-<timestamp>.tar.gz)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import vehicles from a JSON array
    #[command(display_order = 22)]
    Import { path: PathBuf },

    /// Check and fix data inconsistencies
    #[command(display_order = 23)]
    Doctor,
}

#[derive(Subcommand, Debug)]
pub enum BackupAction {
    /// List backups, newest first
    List,
    /// Drop backups beyond the retention setting
    Prune,
    /// Replace the active inventory with a backup
    Restore {
        /// Position in `backups list`, key, or timestamp (defaults to the newest)
        backup: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DeskCommands {
    /// Quote a monthly loan payment
    #[command(display_order = 30)]
    Loan {
        /// Vehicle whose list price to finance
        #[arg(long, conflicts_with = "price")]
        vehicle: Option<String>,

        #[arg(long, required_unless_present = "vehicle")]
        price: Option<f64>,

        #[arg(long, default_value_t = 0.0)]
        down: f64,

        /// Annual percentage rate, e.g. 6.9
        #[arg(long)]
        apr: f64,

        #[arg(long, default_value_t = 60)]
        months: u32,
    },

    /// Estimate the return on an auction purchase
    #[command(display_order = 31)]
    Roi {
        #[arg(long)]
        hammer: f64,

        #[arg(long, default_value_t = 0.0)]
        fee: f64,

        #[arg(long, default_value_t = 0.0)]
        transport: f64,

        #[arg(long, default_value_t = 0.0)]
        recon: f64,

        /// Expected sale price
        #[arg(long)]
        sale: f64,
    },
}

#[derive(Subcommand, Debug)]
pub enum MiscCommands {
    /// Get or set configuration
    #[command(display_order = 40)]
    Config {
        /// Configuration key (storage_key, backup_retention, placeholder_image)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },

    /// Print help for dealerlot or a subcommand
    #[command(display_order = 41)]
    Help {
        command: Option<String>,
    },
}
