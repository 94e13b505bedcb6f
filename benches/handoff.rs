use criterion::{black_box, criterion_group, criterion_main, Criterion};
use depth_bridge::capture::FrameSink;
use depth_bridge::{
    CaptureCallbackHandler, DepthConverter, DepthFormat, DepthFrame, DepthModel, DeviceConfig,
    DualChannelStore, MockDevice,
};
use std::sync::Arc;

fn depth_conversion(c: &mut Criterion) {
    let config = DeviceConfig::default();
    let converter = DepthConverter::new(DepthModel::default());
    let samples: Vec<u16> = (0..config.depth.pixel_count())
        .map(|i| (i % 2048) as u16)
        .collect();

    c.bench_function("convert_frame_640x480", |b| {
        b.iter(|| converter.convert_frame(black_box(&samples), config.depth))
    });
}

fn depth_callback(c: &mut Criterion) {
    let mut group = c.benchmark_group("on_depth_payload");

    for format in [DepthFormat::Unpacked11Bit, DepthFormat::Packed11Bit] {
        let mut config = DeviceConfig::default();
        config.depth_format = format;
        let payload = MockDevice::new(&config).depth_payload(1);
        let store = Arc::new(DualChannelStore::new(640, 480, 640, 480));
        let handler = CaptureCallbackHandler::new(store, &config);

        group.bench_function(format!("{:?}", format), |b| {
            b.iter(|| handler.on_depth_payload(black_box(&payload), 0))
        });
    }

    group.finish();
}

fn buffer_handoff(c: &mut Criterion) {
    let store = DualChannelStore::new(640, 480, 640, 480);
    let frame = DepthFrame::blank(640, 480);
    let mut out = DepthFrame::blank(640, 480);

    c.bench_function("write_then_read_depth", |b| {
        b.iter(|| {
            store.write_depth(frame.clone());
            black_box(store.read_depth(&mut out))
        })
    });
}

criterion_group!(benches, depth_conversion, depth_callback, buffer_handoff);
criterion_main!(benches);
