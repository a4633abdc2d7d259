#![no_main]

use blitosc_engine::{
    spawn_oscillator, BlockRequest, EngineContext, OscillatorConfiguration, OscillatorKind,
    BLOCK_SIZE_OS,
};
use libfuzzer_sys::fuzz_target;

// Input layout: 8 control bytes followed by configuration JSON.
fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }
    let (head, json) = data.split_at(8);
    let Ok(text) = std::str::from_utf8(json) else {
        return;
    };
    let Ok(config) = OscillatorConfiguration::from_json(text) else {
        return;
    };

    let kind = OscillatorKind::ALL[head[0] as usize % OscillatorKind::ALL.len()];
    let pitch = i8::from_le_bytes([head[1]]) as f32 + head[2] as f32 / 256.0;
    let drift = head[3] as f32 / 255.0;
    let stereo = head[4] & 1 == 1;
    let fm_depth = i8::from_le_bytes([head[5]]) as f32 / 64.0;
    let mut modulator = [0.0f32; BLOCK_SIZE_OS];
    for (i, m) in modulator.iter_mut().enumerate() {
        *m = ((i as f32 + head[6] as f32) * 0.1).sin();
    }

    let Ok(ctx) = EngineContext::new(44100.0) else {
        return;
    };
    let mut osc = spawn_oscillator(kind, ctx.with_seed(head[7] as u32), &config);
    osc.init(pitch, head[4] & 2 == 2);

    for block in 0..16 {
        let mut request = BlockRequest::new(pitch).with_drift(drift).stereo(stereo);
        if block % 2 == 1 {
            request = request.with_fm(fm_depth, &modulator);
        }
        osc.process_block(&request);
        assert!(osc.output_left().iter().all(|s| s.is_finite()));
        if stereo {
            assert!(osc.output_right().iter().all(|s| s.is_finite()));
        }
    }

    if let Ok(json) = config.sanitized().to_json_pretty() {
        let reparsed = OscillatorConfiguration::from_json(&json);
        assert!(reparsed.is_ok());
    }
});
