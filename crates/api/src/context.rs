//! Application context - dependency injection container

use std::sync::Arc;

use cadence_core::hierarchy::ports::{IrRepository, ProvisionedIdRepository};
use cadence_core::reporting::ports::ActivityRepository;
use cadence_core::targets::ports::TargetRepository;
use cadence_core::teams::ports::TeamRepository;
use cadence_core::{HierarchyService, ReportingService, TargetsService, TeamsService};
use cadence_domain::{Config, Result, WeekScheme};
use cadence_infra::{
    DbManager, SqliteActivityRepository, SqliteIrRepository, SqliteProvisionedIdRepository,
    SqliteTargetRepository, SqliteTeamRepository,
};

/// Type alias for IR repository port trait object
type DynIrRepository = dyn IrRepository + 'static;

/// Type alias for provisioned id repository port trait object
type DynProvisionedIdRepository = dyn ProvisionedIdRepository + 'static;

/// Type alias for team repository port trait object
type DynTeamRepository = dyn TeamRepository + 'static;

/// Type alias for activity repository port trait object
type DynActivityRepository = dyn ActivityRepository + 'static;

/// Type alias for target repository port trait object
type DynTargetRepository = dyn TargetRepository + 'static;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub scheme: WeekScheme,
    pub db: Arc<DbManager>,
    pub hierarchy: HierarchyService,
    pub teams: TeamsService,
    pub reporting: ReportingService,
    pub targets: TargetsService,
}

impl AppContext {
    /// Wire repositories and services against a migrated database.
    pub fn new(config: Config) -> Result<Self> {
        let scheme = WeekScheme::new(
            config.week.utc_offset_seconds,
            config.week.min_year,
            config.week.max_year,
        )?;

        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let irs: Arc<DynIrRepository> = Arc::new(SqliteIrRepository::new(db.clone()));
        let provisioned: Arc<DynProvisionedIdRepository> =
            Arc::new(SqliteProvisionedIdRepository::new(db.clone()));
        let teams: Arc<DynTeamRepository> =
            Arc::new(SqliteTeamRepository::new(db.clone(), scheme));
        let activities: Arc<DynActivityRepository> =
            Arc::new(SqliteActivityRepository::new(db.clone(), scheme));
        let targets: Arc<DynTargetRepository> =
            Arc::new(SqliteTargetRepository::new(db.clone(), scheme));

        Ok(Self {
            hierarchy: HierarchyService::new(irs.clone(), provisioned),
            teams: TeamsService::new(teams.clone(), irs.clone()),
            reporting: ReportingService::new(
                scheme,
                activities,
                targets.clone(),
                irs.clone(),
                teams.clone(),
            ),
            targets: TargetsService::new(scheme, targets, irs, teams),
            config,
            scheme,
            db,
        })
    }

    /// The current instant in the scheme's fixed offset.
    pub fn now(&self) -> cadence_domain::Instant {
        self.scheme.to_local(chrono::Utc::now())
    }
}
