// 프레임 캐시 (LRU) - 메모리 예산 안에서 디코딩된 프레임 보관
// 키: 프레임 번호, 퇴출: 사용 카운터가 가장 작은 엔트리부터

use std::collections::{BTreeMap, HashMap};

/// 엔트리당 고정 오버헤드 (픽셀 버퍼를 제외한 레코드 크기)
pub const ENTRY_OVERHEAD_BYTES: u64 = std::mem::size_of::<CachedFrame>() as u64;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// 캐시된 프레임 하나
///
/// 픽셀 버퍼는 이 엔트리가 단독 소유한다. 화면 쪽으로는 복사해서만 내보낸다.
#[derive(Debug)]
pub struct CachedFrame {
    frame_index: i64,
    pixels: Box<[u8]>,
    last_use_tick: u64,
}

impl CachedFrame {
    pub fn frame_index(&self) -> i64 {
        self.frame_index
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn byte_size(&self) -> u64 {
        self.pixels.len() as u64
    }

    pub fn last_use_tick(&self) -> u64 {
        self.last_use_tick
    }

    fn accounted_bytes(&self) -> u64 {
        ENTRY_OVERHEAD_BYTES + self.byte_size()
    }
}

/// LRU 프레임 캐시
///
/// `recency`는 last_use_tick → 프레임 번호 역인덱스. 틱은 재사용되지 않으므로
/// 가장 앞 항목이 항상 퇴출 대상이다.
pub struct FrameCache {
    entries: HashMap<i64, CachedFrame>,
    recency: BTreeMap<u64, i64>,
    total_bytes: u64,
    use_counter: u64,
    budget_bytes: u64,
    hit_count: u64,
    miss_count: u64,
}

impl FrameCache {
    /// 바이트 단위 예산으로 생성
    pub fn new(budget_bytes: u64) -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            total_bytes: 0,
            use_counter: 0,
            budget_bytes,
            hit_count: 0,
            miss_count: 0,
        }
    }

    /// MB 단위 예산으로 생성 (커맨드라인 인자 그대로)
    pub fn with_megabytes(budget_mb: u64) -> Self {
        Self::new(budget_mb.saturating_mul(BYTES_PER_MB))
    }

    /// 프레임 저장
    /// - 이미 있는 프레임 번호면 아무것도 하지 않음 (recency 갱신 없음)
    /// - 저장 후 예산 초과 시 가장 오래 안 쓴 엔트리부터 퇴출
    /// - 단일 엔트리가 예산보다 크면 그 하나만 남기고 초과 상태 유지
    pub fn put(&mut self, frame_index: i64, pixel_data: &[u8]) {
        if self.entries.contains_key(&frame_index) {
            return;
        }

        let tick = self.next_tick();
        let record = CachedFrame {
            frame_index,
            pixels: pixel_data.into(),
            last_use_tick: tick,
        };

        self.total_bytes += record.accounted_bytes();
        self.recency.insert(tick, frame_index);
        self.entries.insert(frame_index, record);

        while self.total_bytes > self.budget_bytes && self.entries.len() > 1 {
            self.evict_oldest();
        }

        self.check_invariants();
    }

    /// 캐시 조회 (히트 시 recency 갱신, 조회가 상태를 바꾼다)
    pub fn get(&mut self, frame_index: i64) -> Option<&CachedFrame> {
        if !self.entries.contains_key(&frame_index) {
            self.miss_count += 1;
            return None;
        }

        self.hit_count += 1;
        let tick = self.next_tick();
        let record = self.entries.get_mut(&frame_index)?;
        self.recency.remove(&record.last_use_tick);
        record.last_use_tick = tick;
        self.recency.insert(tick, frame_index);

        Some(&*record)
    }

    /// recency를 건드리지 않는 존재 확인
    pub fn contains(&self, frame_index: i64) -> bool {
        self.entries.contains_key(&frame_index)
    }

    /// 진단용 사용량 (MB)
    pub fn used_megabytes(&self) -> f64 {
        self.total_bytes as f64 / BYTES_PER_MB as f64
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn budget_bytes(&self) -> u64 {
        self.budget_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 캐시된 프레임 번호 (순서 무관, 디버그 오버레이용)
    pub fn frame_indices(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.keys().copied()
    }

    /// 통계 조회 (히트, 미스)
    pub fn stats(&self) -> (u64, u64) {
        (self.hit_count, self.miss_count)
    }

    fn next_tick(&mut self) -> u64 {
        let tick = self.use_counter;
        self.use_counter += 1;
        tick
    }

    fn evict_oldest(&mut self) {
        let Some((_, frame_index)) = self.recency.pop_first() else {
            return;
        };
        if let Some(record) = self.entries.remove(&frame_index) {
            self.total_bytes -= record.accounted_bytes();
            crate::debug_log!("cache evict frame {} (tick {})", frame_index, record.last_use_tick);
        }
    }

    fn check_invariants(&self) {
        debug_assert_eq!(self.entries.len(), self.recency.len());
        debug_assert_eq!(
            self.total_bytes,
            self.entries.values().map(CachedFrame::accounted_bytes).sum::<u64>()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_BYTES: usize = 100;

    fn entry_cost() -> u64 {
        FRAME_BYTES as u64 + ENTRY_OVERHEAD_BYTES
    }

    fn cache_for_entries(count: u64) -> FrameCache {
        FrameCache::new(entry_cost() * count)
    }

    fn pixels(fill: u8) -> Vec<u8> {
        vec![fill; FRAME_BYTES]
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = cache_for_entries(4);
        cache.put(3, &pixels(7));

        let frame = cache.get(3).expect("frame 3 cached");
        assert_eq!(frame.frame_index(), 3);
        assert_eq!(frame.byte_size(), FRAME_BYTES as u64);
        assert!(frame.pixels().iter().all(|&b| b == 7));
        assert_eq!(cache.total_bytes(), entry_cost());
    }

    #[test]
    fn test_duplicate_put_is_noop() {
        let mut cache = cache_for_entries(4);
        cache.put(1, &pixels(1));
        let tick_before = cache.entries[&1].last_use_tick();
        let bytes_before = cache.total_bytes();

        cache.put(1, &pixels(9));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.total_bytes(), bytes_before);
        assert_eq!(cache.entries[&1].last_use_tick(), tick_before);
        // 기존 데이터 유지
        assert!(cache.entries[&1].pixels().iter().all(|&b| b == 1));
    }

    #[test]
    fn test_single_entry_budget_evicts_previous() {
        let mut cache = cache_for_entries(1);
        cache.put(5, &pixels(5));
        cache.put(7, &pixels(7));

        assert!(!cache.contains(5));
        assert!(cache.contains(7));
        assert_eq!(cache.len(), 1);
        let expected_mb = entry_cost() as f64 / (1024.0 * 1024.0);
        assert!((cache.used_megabytes() - expected_mb).abs() < 1e-12);
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut cache = cache_for_entries(3);
        for i in 0..3 {
            cache.put(i, &pixels(i as u8));
        }
        cache.put(3, &pixels(3));

        // 0번이 가장 오래됨 → 퇴출
        assert!(!cache.contains(0));
        assert!(cache.contains(1));
        assert!(cache.contains(2));
        assert!(cache.contains(3));
    }

    #[test]
    fn test_get_postpones_eviction() {
        let mut cache = cache_for_entries(3);
        for i in 0..3 {
            cache.put(i, &pixels(i as u8));
        }
        assert!(cache.get(0).is_some());

        cache.put(3, &pixels(3));
        assert!(cache.contains(0));
        assert!(!cache.contains(1));

        cache.put(4, &pixels(4));
        assert!(cache.contains(0));
        assert!(!cache.contains(2));
    }

    #[test]
    fn test_oversized_entry_stays_alone() {
        let mut cache = cache_for_entries(2);
        cache.put(0, &pixels(0));
        cache.put(1, &pixels(1));

        let huge = vec![0u8; FRAME_BYTES * 10];
        cache.put(2, &huge);

        assert_eq!(cache.len(), 1);
        assert!(cache.contains(2));
        assert!(cache.total_bytes() > cache.budget_bytes());
    }

    #[test]
    fn test_budget_converges_after_every_put() {
        let mut cache = cache_for_entries(5);
        for i in 0..50i64 {
            // 가끔 큰 프레임 섞기
            let size = if i % 7 == 0 { FRAME_BYTES * 3 } else { FRAME_BYTES };
            cache.put(i % 13, &vec![0u8; size]);
            if i % 3 == 0 {
                let _ = cache.get(i / 2);
            }
            assert!(cache.total_bytes() <= cache.budget_bytes() || cache.len() == 1);
            assert_eq!(cache.len(), cache.frame_indices().count());
        }
    }

    #[test]
    fn test_hit_miss_stats() {
        let mut cache = cache_for_entries(4);
        cache.put(0, &pixels(0));

        assert!(cache.get(0).is_some());
        assert!(cache.get(10).is_none());
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_with_megabytes() {
        let cache = FrameCache::with_megabytes(2048);
        assert_eq!(cache.budget_bytes(), 2048 * 1024 * 1024);
        assert!(cache.is_empty());
        assert_eq!(cache.used_megabytes(), 0.0);
    }
}
