mod basic;
mod channels;
mod distribution;
mod over_time;

pub use basic::{Overview, overview};
pub use channels::{CHANNEL_COUNT, ChannelActivityRow, channel_activity};
pub use distribution::{Distribution, RangeConfig, value_distribution};
pub use over_time::{ThroughputRow, TimeStatsRow, throughput_over_time, windowed_stats};
