//! IdGenerator port - artifact id 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）
//!
//! 衝突ガード（既存 id との重複チェック）は Archive 側で行います。

use std::sync::Mutex;
use std::time::SystemTime;

use ulid::{Generator, Ulid};

use crate::domain::ArtifactId;
use crate::ports::Clock;

/// IdGenerator は artifact id を生成
///
/// # ULID の特性
/// - 時刻でソート可能（id 昇順 = 作成順）
/// - 調整なしで複数ノードから生成可能
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> ArtifactId;
}

/// UlidGenerator は Clock の時刻から ULID を作る
///
/// 同じミリ秒内では乱数部分をインクリメントするので、1 つの generator が
/// 返す id は常に昇順です。FixedClock を使えば timestamp 部分を固定できます。
pub struct UlidGenerator<C> {
    clock: C,
    state: Mutex<Generator>,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: Mutex::new(Generator::new()),
        }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate(&self) -> ArtifactId {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let ulid = match state.generate_from_datetime(SystemTime::from(now)) {
            Ok(ulid) => ulid,
            // 同一ミリ秒で乱数部分を使い切った
            Err(err) => {
                tracing::warn!(error = %err, "monotonic ulid overflow, falling back to random");
                Ulid::from_parts(now.timestamp_millis().max(0) as u64, rand::random())
            }
        };
        ArtifactId::from_ulid(ulid)
    }
}
