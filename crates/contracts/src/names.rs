//! Well-known check names and delivery header keys.

/// Check names understood by the routing layer.
pub mod check_names {
    pub const PROCESS: &str = "process";
    pub const RT_PROCESS: &str = "rtprocess";
    pub const CONTAINER: &str = "container";
    pub const RT_CONTAINER: &str = "rtcontainer";
    pub const CONNECTIONS: &str = "connections";
    pub const POD: &str = "pod";
    pub const PROCESS_DISCOVERY: &str = "process_discovery";
    pub const PROCESS_EVENTS: &str = "process_events";

    /// Every check name with a known delivery route
    pub const ALL: [&str; 8] = [
        PROCESS,
        RT_PROCESS,
        CONTAINER,
        RT_CONTAINER,
        CONNECTIONS,
        POD,
        PROCESS_DISCOVERY,
        PROCESS_EVENTS,
    ];
}

/// Delivery header keys and well-known values.
pub mod headers {
    pub const TIMESTAMP: &str = "X-DD-Agent-Timestamp";
    pub const HOST: &str = "X-Dd-Hostname";
    pub const PROCESS_VERSION: &str = "X-Dd-Processagentversion";
    pub const CONTAINER_COUNT: &str = "X-Dd-ContainerCount";
    pub const CLUSTER_ID: &str = "X-Dd-Orchestrator-ClusterID";
    pub const EVP_ORIGIN: &str = "DD-EVP-ORIGIN";
    pub const EVP_ORIGIN_VERSION: &str = "DD-EVP-ORIGIN-VERSION";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_ENCODING: &str = "Content-Encoding";

    pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";
    pub const ZSTD_CONTENT_ENCODING: &str = "zstd";
    pub const AGENT_ORIGIN: &str = "process-agent";
}
