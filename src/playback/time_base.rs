// pts ↔ 프레임 번호 변환
// 첫 디코딩 패킷의 pts/duration으로 한 번만 고정됨

use crate::error::PlayerError;

/// 세션 타임베이스 (establish 이후 불변)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeBase {
    origin: Option<Origin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Origin {
    zero_pts: i64,
    ticks_per_frame: i64,
}

impl TimeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_established(&self) -> bool {
        self.origin.is_some()
    }

    /// 첫 프레임 기준으로 고정. 두 번 호출하면 panic (호출 순서 버그)
    pub fn establish(&mut self, first_pts: i64, first_duration: i64) -> Result<(), PlayerError> {
        assert!(
            self.origin.is_none(),
            "time base already established (zero pts {:?})",
            self.origin.map(|o| o.zero_pts)
        );
        if first_duration <= 0 {
            return Err(PlayerError::InvalidTiming {
                pts: first_pts,
                duration: first_duration,
            });
        }

        self.origin = Some(Origin {
            zero_pts: first_pts,
            ticks_per_frame: first_duration,
        });
        log::debug!("time base established: zero pts {}, {} ticks/frame", first_pts, first_duration);
        Ok(())
    }

    pub fn zero_pts(&self) -> Option<i64> {
        self.origin.map(|o| o.zero_pts)
    }

    pub fn ticks_per_frame(&self) -> Option<i64> {
        self.origin.map(|o| o.ticks_per_frame)
    }

    /// (pts - zero) / ticks, 0 방향 절삭
    /// 간격이 고르지 않은 pts는 절삭 오차가 생길 수 있음 (정상)
    pub fn pts_to_frame(&self, pts: i64) -> i64 {
        let origin = self.origin_or_panic();
        (pts - origin.zero_pts) / origin.ticks_per_frame
    }

    pub fn frame_to_pts(&self, frame_index: i64) -> i64 {
        let origin = self.origin_or_panic();
        origin.zero_pts + frame_index * origin.ticks_per_frame
    }

    fn origin_or_panic(&self) -> Origin {
        match self.origin {
            Some(origin) => origin,
            None => panic!("time base used before the first frame was decoded"),
        }
    }
}
