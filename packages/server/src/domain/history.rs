//! History Store
//!
//! ルームごとのホワイトボード・チャット履歴を保持する追記専用ログ。
//! 新規参加者へ挿入順に再生されます。容量に達した場合は最も古いエントリから破棄します。

use std::collections::VecDeque;

/// 追記専用の履歴ログ（容量付き）
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    capacity: usize,
    evicted: u64,
}

impl<T: Clone> History<T> {
    /// 指定した容量で空の履歴を作成
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            evicted: 0,
        }
    }

    /// エントリを末尾に追加する
    ///
    /// 容量を超えた場合は最も古いエントリを破棄し、`true` を返す
    pub fn append(&mut self, entry: T) -> bool {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
            true
        } else {
            false
        };
        self.entries.push_back(entry);
        evicted
    }

    /// 挿入順のスナップショットを返す
    pub fn replay(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }

    /// 全エントリを破棄する
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// これまでに容量超過で破棄されたエントリ数
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}
