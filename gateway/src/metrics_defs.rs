use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS_FORWARDED: MetricDef = MetricDef {
    name: "gateway.requests.forwarded",
    metric_type: MetricType::Counter,
    description: "Requests matched against the routing table and sent upstream",
};

pub const REQUESTS_UNMATCHED: MetricDef = MetricDef {
    name: "gateway.requests.unmatched",
    metric_type: MetricType::Counter,
    description: "Requests whose Host header had no route mapping",
};

pub const UPSTREAM_FAILURES: MetricDef = MetricDef {
    name: "gateway.upstream.failures",
    metric_type: MetricType::Counter,
    description: "Forwarding attempts that failed or timed out at the transport level",
};

pub const UPSTREAM_DURATION: MetricDef = MetricDef {
    name: "gateway.upstream.duration",
    metric_type: MetricType::Histogram,
    description: "Seconds from sending a request upstream to receiving its response head",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUESTS_FORWARDED,
    REQUESTS_UNMATCHED,
    UPSTREAM_FAILURES,
    UPSTREAM_DURATION,
];
