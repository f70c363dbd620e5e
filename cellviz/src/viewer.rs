#![allow(non_snake_case)]
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use cell_plots::Figure;
use dioxus::{
    desktop::{Config, LogicalSize, WindowBuilder},
    prelude::*,
};

const WINDOW_TITLE: &str = "Single Cell Viewer";

#[derive(Clone, PartialEq)]
struct FigureImage {
    src: String,
    width: u32,
}

/// Opens a desktop window showing the saved figure. Does not return once the
/// event loop starts.
pub fn show(figure: Figure) {
    let (width, _) = figure.dimensions();
    let image = FigureImage {
        src: format!(
            "data:image/png;base64,{}",
            BASE64_STANDARD.encode(figure.png_bytes())
        ),
        width,
    };

    LaunchBuilder::new()
        .with_cfg(
            Config::new().with_window(
                WindowBuilder::new()
                    .with_title(WINDOW_TITLE)
                    .with_always_on_top(false)
                    .with_inner_size(LogicalSize::new(1600.0, 760.0)),
            ),
        )
        .with_context(image)
        .launch(App);
}

#[component]
fn App() -> Element {
    let image = use_context::<FigureImage>();

    rsx! {
        div { style: "display: flex; justify-content: center; align-items: center; background: white; min-height: 100vh;",
            img {
                style: "max-width: 100%; height: auto; user-select: none; -webkit-user-select: none;",
                src: "{image.src}",
                width: "{image.width}",
            }
        }
    }
}
