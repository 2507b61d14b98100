// 재생 창 - 틱 구동, 텍스처 업로드, 상태 표시줄, 캐시 디버그 오버레이

use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui;

use super::yuv::yuv420_to_rgba;
use crate::error::PlayerError;
use crate::playback::{Converter, Decoder, InputEvent, PlaybackController, Session, TickReport};

/// 키 → 입력 이벤트
pub const KEY_BINDINGS: [(egui::Key, InputEvent); 8] = [
    (egui::Key::L, InputEvent::Play),
    (egui::Key::K, InputEvent::Pause),
    (egui::Key::J, InputEvent::Rewind),
    (egui::Key::F, InputEvent::StepForward),
    (egui::Key::D, InputEvent::StepBackward),
    (egui::Key::C, InputEvent::ToggleCacheDebug),
    (egui::Key::Q, InputEvent::Quit),
    (egui::Key::Escape, InputEvent::Quit),
];

/// 캐시 디버그 띠 (픽셀 단위, 프레임 번호 = x좌표)
pub const CACHE_STRIP_WIDTH: i64 = 1920;
const CACHE_STRIP_TOP: f32 = 50.0;
const CACHE_STRIP_BOTTOM: f32 = 100.0;

pub fn map_key(key: egui::Key) -> Option<InputEvent> {
    KEY_BINDINGS
        .iter()
        .find(|(bound, _)| *bound == key)
        .map(|(_, event)| *event)
}

/// 캐시 오버레이에 그릴 선
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMarks {
    /// 캐시된 프레임 (초록)
    pub cached: Vec<i64>,
    /// 화면 프레임 (파랑), 띠 밖이면 None
    pub displayed: Option<i64>,
}

/// 띠 폭을 벗어나는 프레임은 생략
pub fn cache_marks(
    cached: impl IntoIterator<Item = i64>,
    displayed: i64,
    strip_width: i64,
) -> CacheMarks {
    let visible = |frame: &i64| (0..strip_width).contains(frame);
    let mut cached: Vec<i64> = cached.into_iter().filter(visible).collect();
    cached.sort_unstable();
    CacheMarks {
        cached,
        displayed: Some(displayed).filter(visible),
    }
}

pub struct PlayerWindow<D: Decoder, C: Converter<D::Raw>> {
    session: Session<D, C>,
    controller: PlaybackController,
    texture: Option<egui::TextureHandle>,
    /// 텍스처에 올라가 있는 프레임 번호
    texture_frame: Option<i64>,
    rgba: Vec<u8>,
    last_report: Option<TickReport>,
    /// 치명적 에러를 창 밖(run_window)으로 전달
    fatal: Rc<RefCell<Option<PlayerError>>>,
    closing: bool,
}

impl<D: Decoder, C: Converter<D::Raw>> PlayerWindow<D, C> {
    pub fn new(
        session: Session<D, C>,
        controller: PlaybackController,
        fatal: Rc<RefCell<Option<PlayerError>>>,
    ) -> Self {
        Self {
            session,
            controller,
            texture: None,
            texture_frame: None,
            rgba: Vec::new(),
            last_report: None,
            fatal,
            closing: false,
        }
    }

    fn poll_input(&mut self, ctx: &egui::Context) {
        let (events, close_requested) = ctx.input(|i| {
            let events: Vec<InputEvent> = KEY_BINDINGS
                .iter()
                .filter(|(key, _)| i.key_pressed(*key))
                .map(|(_, event)| *event)
                .collect();
            (events, i.viewport().close_requested())
        });

        for event in events {
            log::debug!("input: {:?}", event);
            self.controller.handle_input(event);
        }
        if close_requested {
            self.controller.handle_input(InputEvent::Quit);
        }
    }

    fn upload_frame(&mut self, ctx: &egui::Context, frame_index: i64) -> Result<(), PlayerError> {
        if self.texture_frame == Some(frame_index) {
            return Ok(());
        }

        let info = *self.session.info();
        let (width, height) = (info.width as usize, info.height as usize);
        yuv420_to_rgba(self.session.frame_data(), width, height, &mut self.rgba)?;
        let image = egui::ColorImage::from_rgba_unmultiplied([width, height], &self.rgba);

        match self.texture.as_mut() {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("video-frame", image, egui::TextureOptions::LINEAR));
            }
        }
        self.texture_frame = Some(frame_index);
        Ok(())
    }

    fn step(&mut self, ctx: &egui::Context) -> Result<(), PlayerError> {
        let report = self.controller.tick(&mut self.session)?;
        self.upload_frame(ctx, report.displayed)?;
        self.last_report = Some(report);
        Ok(())
    }

    fn close(&mut self, ctx: &egui::Context, error: Option<PlayerError>) {
        if self.closing {
            return;
        }
        self.closing = true;

        let (hits, misses) = self.session.cache.stats();
        let (reads, seeks) = self.session.io_counters();
        log::info!(
            "cache hits: {}, misses: {}, decoded frames: {}, container seeks: {}",
            hits,
            misses,
            reads,
            seeks
        );

        if let Some(err) = error {
            *self.fatal.borrow_mut() = Some(err);
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn draw_frame(&self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                if let Some(texture) = &self.texture {
                    let size = ui.available_size();
                    ui.add(
                        egui::Image::new(egui::load::SizedTexture::from_handle(texture))
                            .fit_to_exact_size(size),
                    );
                }
            });
    }

    fn draw_status(&self, ctx: &egui::Context) {
        let Some(report) = &self.last_report else {
            return;
        };
        let text = report.status_text(self.session.cache.used_megabytes());

        egui::Area::new(egui::Id::new("status-line"))
            .fixed_pos(egui::pos2(0.0, 0.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(egui::Color32::BLACK)
                    .inner_margin(egui::Margin::same(4))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(text)
                                .monospace()
                                .color(egui::Color32::WHITE),
                        );
                    });
            });
    }

    fn draw_cache_debug(&self, ctx: &egui::Context) {
        let marks = cache_marks(
            self.session.cache.frame_indices(),
            self.controller.displayed_frame(),
            CACHE_STRIP_WIDTH,
        );
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("cache-debug"),
        ));

        painter.rect_filled(
            egui::Rect::from_min_max(
                egui::pos2(0.0, CACHE_STRIP_TOP),
                egui::pos2(CACHE_STRIP_WIDTH as f32, CACHE_STRIP_BOTTOM),
            ),
            0.0,
            egui::Color32::RED,
        );

        let line = |x: i64, color: egui::Color32| {
            let x = x as f32 + 0.5;
            painter.line_segment(
                [egui::pos2(x, CACHE_STRIP_TOP), egui::pos2(x, CACHE_STRIP_BOTTOM)],
                egui::Stroke::new(1.0, color),
            );
        };
        for frame in marks.cached {
            line(frame, egui::Color32::GREEN);
        }
        if let Some(frame) = marks.displayed {
            line(frame, egui::Color32::BLUE);
        }
    }
}

impl<D: Decoder, C: Converter<D::Raw>> eframe::App for PlayerWindow<D, C> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.closing {
            return;
        }

        self.poll_input(ctx);
        if self.controller.quit_requested() {
            self.close(ctx, None);
            return;
        }

        if let Err(err) = self.step(ctx) {
            if err.is_end_of_stream() {
                log::info!("end of stream reached");
            } else {
                log::error!("playback stopped: {}", err);
            }
            self.close(ctx, Some(err));
            return;
        }

        self.draw_frame(ctx);
        self.draw_status(ctx);
        if self.controller.cache_debug() {
            self.draw_cache_debug(ctx);
        }

        // vsync에 맞춰 매 화면 갱신마다 한 틱
        ctx.request_repaint();
    }
}
