/// Helper function to use JavaScript's Math.random
pub(crate) fn js_random_seed() -> u64 {
    use js_sys::Math::random;
    u64::from_be_bytes([
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
    ])
}

/// Replaces the address fragment without adding a history entry, so the
/// current level can be shared by copying the address.
pub(crate) fn write_fragment(token: &str) {
    use gloo::utils::{history, window};

    let url = format!("#{}", token);
    if let Err(err) = history().replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&url)) {
        log::warn!("failed to update fragment: {:?}", err);
        if let Err(err) = window().location().set_hash(token) {
            log::error!("failed to set fragment: {:?}", err);
        }
    }
}
