// Wire models shared by HTTP responses and WebSocket events

mod container;
mod events;
mod host;
mod ports;
mod system;
mod widgets;

pub use container::{ContainerInfo, ContainerState, ContainerStats};
pub use events::{
    ClientEvent, ContainerStatsEvent, ErrorMessage, LogChunk, LogStreamError, LogStreamStopped,
    ServerEvent, Topic,
};
pub use host::{Alert, AlertLevel, AlertMetrics, AlertReport, AlertThresholds, Session};
pub use ports::{CommonPort, DetectedService, PortStatus};
pub use system::{
    CpuSnapshot, DiskUsage, InterfaceRate, MemorySnapshot, OsInfo, SwapSnapshot, SystemSnapshot,
};
pub use widgets::{
    CryptoPrice, CurrentWeather, ForecastDay, GitHubRepo, NewsItem, TempRange, UpstreamState,
    UpstreamStatus, WeatherData,
};
