//! # Command Layer
//!
//! Business logic for every dealer operation. Commands take the in-memory
//! [`InventoryState`] (and, where they need it, the store) as plain arguments and
//! return a [`CmdResult`]. They never print, never read stdin, and never decide
//! when to back up or persist: sequencing of backup, mutation, recompute and save
//! is owned by [`crate::api::DealerApi`].
//!
//! Id-keyed commands fail with `VehicleNotFound`/`DraftNotFound` and leave the
//! state untouched when the id is unknown.

use crate::config::DealerConfig;
use crate::error::{DealerError, Result};
use crate::index::DisplayVehicle;
use crate::metrics::{InventoryMetrics, SalesMetrics};
use crate::model::{SavedDraft, Vehicle, VehicleInput};
use crate::state::InventoryState;
use crate::store::BackupEntry;
use std::path::PathBuf;
use uuid::Uuid;

pub mod backups;
pub mod config;
pub mod doctor;
pub mod drafts;
pub mod export;
pub mod import;
pub mod list;
pub mod status;
pub mod vehicles;

#[derive(Debug, Clone)]
pub struct DealerPaths {
    pub data: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// Snapshot of the derived aggregates, for reporting.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total_value: f64,
    pub total_views: u64,
    pub total_likes: usize,
    pub sales: SalesMetrics,
    pub inventory: InventoryMetrics,
}

impl MetricsReport {
    pub fn from_state(state: &InventoryState) -> Self {
        Self {
            total_value: state.total_value,
            total_views: state.total_views,
            total_likes: state.total_likes,
            sales: state.sales_metrics.clone(),
            inventory: state.inventory_metrics.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_vehicles: Vec<Vehicle>,
    pub listed_vehicles: Vec<DisplayVehicle>,
    pub draft: Option<VehicleInput>,
    pub drafts: Vec<SavedDraft>,
    pub backups: Vec<BackupEntry>,
    pub metrics: Option<MetricsReport>,
    pub config: Option<DealerConfig>,
    pub paths: Vec<PathBuf>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    /// Folds the outcome of another command into this one.
    pub fn extend(&mut self, other: CmdResult) {
        self.affected_vehicles.extend(other.affected_vehicles);
        self.listed_vehicles.extend(other.listed_vehicles);
        self.drafts.extend(other.drafts);
        self.backups.extend(other.backups);
        self.paths.extend(other.paths);
        self.messages.extend(other.messages);
        if other.draft.is_some() {
            self.draft = other.draft;
        }
        if other.metrics.is_some() {
            self.metrics = other.metrics;
        }
        if other.config.is_some() {
            self.config = other.config;
        }
    }

    pub fn with_affected_vehicles(mut self, vehicles: Vec<Vehicle>) -> Self {
        self.affected_vehicles = vehicles;
        self
    }

    pub fn with_listed_vehicles(mut self, vehicles: Vec<DisplayVehicle>) -> Self {
        self.listed_vehicles = vehicles;
        self
    }

    pub fn with_drafts(mut self, drafts: Vec<SavedDraft>) -> Self {
        self.drafts = drafts;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsReport) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_config(mut self, config: DealerConfig) -> Self {
        self.config = Some(config);
        self
    }
}

pub(crate) fn active_mut<'a>(state: &'a mut InventoryState, id: &Uuid) -> Result<&'a mut Vehicle> {
    state
        .vehicle_mut(id)
        .ok_or(DealerError::VehicleNotFound(*id))
}
