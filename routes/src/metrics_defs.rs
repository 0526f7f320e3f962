use shared::metrics_defs::{MetricDef, MetricType};

pub const ROUTES_ADDED: MetricDef = MetricDef {
    name: "routes.added",
    metric_type: MetricType::Counter,
    description: "Route mappings added through the control surface",
};

pub const ROUTES_REMOVED: MetricDef = MetricDef {
    name: "routes.removed",
    metric_type: MetricType::Counter,
    description: "Route mappings removed through the control surface",
};

pub const RELOADS: MetricDef = MetricDef {
    name: "routes.reloads",
    metric_type: MetricType::Counter,
    description: "Successful full resyncs of the routing table from the store",
};

pub const ALL_METRICS: &[MetricDef] = &[ROUTES_ADDED, ROUTES_REMOVED, RELOADS];
