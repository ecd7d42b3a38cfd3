//! BrowserScheduler - status timers on `window.setTimeout`

use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::session::{Scheduler, Task, TimerHandle};

#[derive(Clone, Copy, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let Some(window) = web_sys::window() else {
            return TimerHandle::detached();
        };
        let callback = Closure::once_into_js(move || task());
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis) {
            Ok(id) => TimerHandle::new(move || {
                if let Some(window) = web_sys::window() {
                    window.clear_timeout_with_handle(id);
                }
            }),
            Err(e) => {
                super::log!("[beeconnect] setTimeout failed: {:?}", e);
                TimerHandle::detached()
            }
        }
    }
}
