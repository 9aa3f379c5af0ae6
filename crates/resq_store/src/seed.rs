use sea_orm::sea_query::{OnConflict, Query};
use sea_orm::TransactionTrait;
use sea_orm_migration::MigratorTrait;

use crate::db::*;
use crate::migration::Migrator;
use crate::store::exec;
use crate::ResqStore;
use resq_core::{ClusterApi, ClusterSeed, ResqResult, ViewApi};

pub const DEFAULT_WEATHERS: &[(&str, &str)] = &[
    ("extreme1", "Extremes Wetter 1"),
    ("extreme2", "Extremes Wetter 2"),
    ("extreme3", "Extremes Wetter 3"),
    ("mean", "gemittelte Wetterdaten"),
];

pub const DEFAULT_CLIMATES: &[(&str, &str)] = &[
    (
        "RCP8.5",
        "Repräsentative Konzentrationspfad mit Strahlungsantrieb von 8.5 W/m²",
    ),
    (
        "RCP4.5",
        "Repräsentative Konzentrationspfad mit Strahlungsantrieb von 4.5 W/m²",
    ),
    (
        "RCP2.6",
        "Repräsentative Konzentrationspfad mit Strahlungsantrieb von 2.6 W/m²",
    ),
    ("reference", "Historisches Referenzjahr"),
];

/// A reporting period: name, reference year, first and last year covered.
pub struct PeriodSeed {
    pub name: &'static str,
    pub reference_year: i32,
    pub start: i32,
    pub end: i32,
    pub description: &'static str,
}

pub const DEFAULT_PERIODS: &[PeriodSeed] = &[
    PeriodSeed {
        name: "P1",
        reference_year: 2020,
        start: 2005,
        end: 2035,
        description: "Referenzjahr 2020",
    },
    PeriodSeed {
        name: "P2",
        reference_year: 2035,
        start: 2021,
        end: 2050,
        description: "Referenzjahr 2035",
    },
    PeriodSeed {
        name: "P3",
        reference_year: 2050,
        start: 2036,
        end: 2065,
        description: "Referenzjahr 2050",
    },
];

/// Rows written by one seeding pass. Reference rows that already existed are
/// not counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub weathers: u64,
    pub climates: u64,
    pub periods: u64,
    pub labels: u64,
    pub categories: u64,
    pub clusters: usize,
}

impl ResqStore {
    /// Inserts the default weathers, climates and periods. Names that are
    /// already present are left untouched.
    pub async fn seed_reference_data(&self) -> ResqResult<SeedReport> {
        let tx = self.conn.begin().await?;
        let mut report = SeedReport::default();

        let mut weathers = Query::insert()
            .into_table(Weather::Table)
            .columns([Weather::Name, Weather::Description])
            .on_conflict(OnConflict::column(Weather::Name).do_nothing().to_owned())
            .to_owned();
        for (name, description) in DEFAULT_WEATHERS {
            weathers.values_panic([(*name).into(), (*description).into()]);
        }
        report.weathers = exec(&tx, &weathers).await?;

        let mut climates = Query::insert()
            .into_table(Climate::Table)
            .columns([Climate::Name, Climate::Description])
            .on_conflict(OnConflict::column(Climate::Name).do_nothing().to_owned())
            .to_owned();
        for (name, description) in DEFAULT_CLIMATES {
            climates.values_panic([(*name).into(), (*description).into()]);
        }
        report.climates = exec(&tx, &climates).await?;

        let mut periods = Query::insert()
            .into_table(Period::Table)
            .columns([
                Period::Name,
                Period::ReferenceYear,
                Period::PeriodStart,
                Period::PeriodEnd,
                Period::Description,
            ])
            .on_conflict(OnConflict::column(Period::Name).do_nothing().to_owned())
            .to_owned();
        for period in DEFAULT_PERIODS {
            periods.values_panic([
                period.name.into(),
                period.reference_year.into(),
                period.start.into(),
                period.end.into(),
                period.description.into(),
            ]);
        }
        report.periods = exec(&tx, &periods).await?;

        tx.commit().await?;
        if report.weathers + report.climates + report.periods == 0 {
            log::warn!("default weathers, climates and periods already exist");
        } else {
            log::info!(
                "seeded {} weathers, {} climates, {} periods",
                report.weathers,
                report.climates,
                report.periods
            );
        }
        Ok(report)
    }

    /// Replaces the label and category tables with the loaded mappings.
    pub async fn sync_labels_and_categories(&self) -> ResqResult<(u64, u64)> {
        let tx = self.conn.begin().await?;
        exec(&tx, &Query::delete().from_table(Label::Table).to_owned()).await?;
        exec(&tx, &Query::delete().from_table(Category::Table).to_owned()).await?;

        let mut labels = 0;
        if !self.mappings.labels.is_empty() {
            let mut insert = Query::insert()
                .into_table(Label::Table)
                .columns([Label::Component, Label::IsBus, Label::Label])
                .to_owned();
            for (component, entry) in &self.mappings.labels {
                insert.values_panic([
                    component.clone().into(),
                    entry.is_bus.into(),
                    entry.label.clone().into(),
                ]);
            }
            labels = exec(&tx, &insert).await?;
        }

        let mut categories = 0;
        if !self.mappings.categories.is_empty() {
            let mut insert = Query::insert()
                .into_table(Category::Table)
                .columns([
                    Category::FromNode,
                    Category::ToNode,
                    Category::Category,
                    Category::Carrier,
                    Category::IsRenewable,
                ])
                .to_owned();
            for (key, entry) in &self.mappings.categories {
                insert.values_panic([
                    key.from_node.clone().into(),
                    key.to_node.clone().into(),
                    entry.category.clone().into(),
                    entry.carrier.clone().into(),
                    entry.is_renewable.into(),
                ]);
            }
            categories = exec(&tx, &insert).await?;
        }

        tx.commit().await?;
        log::info!("wrote {labels} labels and {categories} categories");
        Ok((labels, categories))
    }

    /// Seeds reference data, labels, categories and clusters. Safe to run
    /// against an already seeded store.
    pub async fn setup(&self, clusters: Vec<ClusterSeed>) -> ResqResult<SeedReport> {
        log::info!("setting up resq store");
        let mut report = self.seed_reference_data().await?;
        let (labels, categories) = self.sync_labels_and_categories().await?;
        report.labels = labels;
        report.categories = categories;
        report.clusters = self.seed_clusters(clusters).await?;
        Ok(report)
    }

    /// Drops every view, then every table. The store must be set up again
    /// (or reconnected) before further use.
    pub async fn teardown(&self) -> ResqResult<()> {
        log::info!("tearing down resq views and tables");
        self.delete_all_views().await?;
        for name in self.list_views().await? {
            self.delete_view(&name).await?;
        }
        Migrator::down(&self.conn, None).await?;
        log::info!("dropped resq schema");
        Ok(())
    }
}
