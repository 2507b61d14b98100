// 외부 협력자 인터페이스 - 디코더 / 픽셀 변환기

use crate::error::PlayerError;

/// 스트림 메타데이터 (open 시 확정)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub time_base_num: i32,
    pub time_base_den: i32,
    /// 평균 프레임레이트 (num, den), 모르면 None
    pub frame_rate: Option<(i32, i32)>,
}

impl StreamInfo {
    /// 캐시에 저장되는 한 프레임 크기 (YUV 4:2:0 planar, 12bpp)
    pub fn frame_data_size(&self) -> usize {
        self.width as usize * self.height as usize * 12 / 8
    }

    /// 프레임레이트로 계산한 한 프레임 길이 (스트림 time_base 단위)
    pub fn ticks_per_frame(&self) -> Option<i64> {
        let (fr_num, fr_den) = self.frame_rate?;
        let denom = i64::from(self.time_base_num) * i64::from(fr_num);
        if denom <= 0 {
            return None;
        }
        let ticks = i64::from(self.time_base_den) * i64::from(fr_den) / denom;
        (ticks > 0).then_some(ticks)
    }
}

/// 디코더가 돌려준 프레임 한 장
pub struct DecodedFrame<R> {
    pub pts: i64,
    pub duration_hint: i64,
    pub is_key: bool,
    pub raw: R,
}

/// 컨테이너 탐색 + 디코딩
pub trait Decoder {
    type Raw;

    fn info(&self) -> &StreamInfo;

    /// 다음 비디오 프레임. 파일 끝이면 `PlayerError::EndOfStream`
    fn read_next_video_frame(&mut self) -> Result<DecodedFrame<Self::Raw>, PlayerError>;

    /// `pts`(스트림 time_base) 위치로 이동. `backward`면 목표 이전 키프레임 쪽으로
    fn seek(&mut self, pts: i64, backward: bool) -> Result<(), PlayerError>;
}

/// 디코딩된 원본 프레임 → 캐시 저장용 픽셀 버퍼
pub trait Converter<R> {
    /// `out`은 정확히 `frame_data_size` 바이트
    fn convert(&mut self, raw: &R, out: &mut [u8]) -> Result<(), PlayerError>;
}
