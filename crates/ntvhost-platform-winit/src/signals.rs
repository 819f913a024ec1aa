use winit::event_loop::EventLoopProxy;

use crate::events::HostUserEvent;

/// Ctrl-C posts a quit notification into the event loop; the module sees it as `Q`.
pub fn install_ctrlc(proxy: EventLoopProxy<HostUserEvent>) {
    let res = ctrlc::set_handler(move || {
        if proxy.send_event(HostUserEvent::Quit).is_err() {
            log::debug!("signals: event loop already closed");
        }
    });

    if let Err(e) = res {
        log::warn!("signals: ctrl-c handler not installed: {e}");
    }
}
