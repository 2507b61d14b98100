// 화면 출력 모듈 (eframe/egui)

pub mod window;
pub mod yuv;

use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui;

use crate::error::PlayerError;
use crate::playback::{Converter, Decoder, PlaybackController, Session};

pub use window::PlayerWindow;

const WINDOW_TITLE: &str = "Video Player";

/// 영상 크기의 창을 열고 닫힐 때까지 재생
/// 창 안에서 난 치명적 에러(EndOfStream 포함)는 여기서 돌려줌
pub fn run_window<D, C>(
    session: Session<D, C>,
    controller: PlaybackController,
) -> Result<(), PlayerError>
where
    D: Decoder,
    C: Converter<D::Raw>,
{
    let info = *session.info();
    let fatal = Rc::new(RefCell::new(None));
    let window = PlayerWindow::new(session, controller, Rc::clone(&fatal));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([info.width as f32, info.height as f32]),
        vsync: true,
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |_cc| Ok(Box::new(window))),
    )
    .map_err(|e| PlayerError::Display(e.to_string()))?;

    match fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
