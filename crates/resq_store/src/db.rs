use sea_orm::sea_query;
use sea_orm_migration::prelude::Iden;

#[derive(Iden, Clone, Copy)]
pub enum Weather {
    Table,
    Id,
    Name,
    Description,
}

#[derive(Iden, Clone, Copy)]
pub enum Climate {
    Table,
    Id,
    Name,
    Description,
}

#[derive(Iden, Clone, Copy)]
pub enum Period {
    Table,
    Id,
    Name,
    ReferenceYear,
    PeriodStart,
    PeriodEnd,
    Description,
}

#[derive(Iden, Clone, Copy)]
pub enum Sensitivity {
    Table,
    Id,
    Node,
    Attribute,
    Value,
}

#[derive(Iden, Clone, Copy)]
pub enum Scenario {
    Table,
    Id,
    PeriodId,
    WeatherId,
    ClimateId,
    SensitivityId,
}

#[derive(Iden, Clone, Copy)]
pub enum Cluster {
    Table,
    Id,
    Name,
    Geometry,
}

#[derive(Iden, Clone, Copy)]
pub enum Scalar {
    Table,
    Id,
    ScenarioId,
    IsExogenous,
    FromNode,
    ToNode,
    Attribute,
    Value,
    ClusterId,
}

#[derive(Iden, Clone, Copy)]
pub enum Sequence {
    Table,
    Id,
    ScenarioId,
    IsExogenous,
    FromNode,
    ToNode,
    Attribute,
    Timeseries,
    TotalEnergy,
    ClusterId,
}

#[derive(Iden, Clone, Copy)]
pub enum Label {
    Table,
    Id,
    Component,
    IsBus,
    Label,
}

#[derive(Iden, Clone, Copy)]
pub enum Category {
    Table,
    Id,
    FromNode,
    ToNode,
    Category,
    Carrier,
    IsRenewable,
}
