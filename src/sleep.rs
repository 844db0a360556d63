use std::time::Duration;

/// Suspends the current task for `delay`.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) async fn sleep(delay: Duration) {
    tokio::time::sleep(delay).await;
}

/// Suspends the current task for `delay` using the host's `setTimeout`.
///
/// Works in browsers and in workers, where `window` does not exist.
#[cfg(target_arch = "wasm32")]
pub(crate) async fn sleep(delay: Duration) {
    use wasm_bindgen::{JsCast, JsValue};

    let millis = delay.as_millis().min(i32::MAX as u128) as f64;
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let set_timeout = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("setTimeout"))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Function>().ok());
        match set_timeout {
            Some(set_timeout) => {
                if set_timeout
                    .call2(&JsValue::NULL, &resolve, &JsValue::from_f64(millis))
                    .is_err()
                {
                    let _ = resolve.call0(&JsValue::NULL);
                }
            }
            // No timer available: resolve immediately rather than hang.
            None => {
                let _ = resolve.call0(&JsValue::NULL);
            }
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}
