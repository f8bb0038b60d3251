use tui_textarea::Input;

use super::Session;

pub enum Event {
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardCTRLF(),
    KeyboardCTRLN(),
    KeyboardCTRLP(),
    KeyboardCTRLR(),
    KeyboardCTRLT(),
    KeyboardEnter(),
    KeyboardEsc(),
    KeyboardPaste(String),
    KeyboardSpecialChar(char),
    SessionUpdated(Box<Session>),
    TranscriptReady(String),
    UIScrollDown(),
    UIScrollPageDown(),
    UIScrollPageUp(),
    UIScrollUp(),
    UITick(),
}
