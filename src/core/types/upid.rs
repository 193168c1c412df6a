//! 进程唯一标识 (UPID)
//!
//! 128 位布局：高 64 位中高 32 位为 ASID、低 32 位为 PID，低 64 位为进程启动时间戳。

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Upid(u128);

impl Upid {
    pub fn new(asid: u32, pid: u32, start_ts: u64) -> Self {
        let high = ((asid as u64) << 32) | pid as u64;
        Self(((high as u128) << 64) | start_ts as u128)
    }

    pub fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u128 {
        self.0
    }

    fn high(&self) -> u64 {
        (self.0 >> 64) as u64
    }

    /// 地址空间 ID
    pub fn asid(&self) -> u32 {
        (self.high() >> 32) as u32
    }

    pub fn pid(&self) -> u32 {
        self.high() as u32
    }

    pub fn start_ts(&self) -> u64 {
        self.0 as u64
    }
}

impl fmt::Display for Upid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.asid(), self.pid(), self.start_ts())
    }
}
