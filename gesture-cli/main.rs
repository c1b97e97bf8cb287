use gesture_cli::{build_pipeline, demo_model, DemoStream, HarrisConfig, Model};
use image::{GrayImage, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_circle_mut;
use std::time::Instant;

const WIDTH: usize = 640;
const HEIGHT: usize = 480;
const FRAMES: usize = 90;

fn main() {
    env_logger::init();

    // Optional model file argument; the built-in demo model otherwise
    let model: Model = match std::env::args().nth(1) {
        Some(path) => Model::load_json(&path).expect("Failed to load model"),
        None => demo_model(),
    };

    let mut cfg = HarrisConfig::new(WIDTH, HEIGHT);
    cfg.n_threads = gesture_core::default_threads();
    let mut processor = build_pipeline(cfg, model).expect("Failed to build pipeline");
    println!("Engine sample rate: {} Hz", processor.sample_rate());

    let mut stream = DemoStream::new(WIDTH, HEIGHT);
    let mut last_image = Vec::new();

    let t0 = Instant::now();
    for i in 0..FRAMES {
        let (hand, img, skin) = stream.next_frame();
        let visualize = i == FRAMES - 1;
        let label = processor
            .update(hand.x, hand.y, hand.z, &img, &skin, visualize)
            .expect("Frame processing failed");

        println!(
            "frame {:02}: {}",
            i,
            processor.label_name(label).unwrap_or("unknown")
        );
        if visualize {
            last_image = img;
        }
    }
    let elapsed = t0.elapsed();
    println!("Processed {} frames in {:.2?}", FRAMES, elapsed);
    println!("{} accepted interest points in the final frame", processor.overlay().len());

    // Draw red circles at the accepted interest points of the final frame
    let gray = GrayImage::from_raw(WIDTH as u32, HEIGHT as u32, last_image)
        .expect("Frame buffer size mismatch");
    let mut output: RgbaImage = image::DynamicImage::ImageLuma8(gray).into_rgba8();
    for p in processor.overlay() {
        draw_hollow_circle_mut(
            &mut output,
            (p.x as i32, p.y as i32),
            3,
            Rgba([255, 0, 0, 255]),
        );
    }

    output
        .save("gesture_overlay.png")
        .expect("Failed to save overlay image");
    println!("Saved overlay image as gesture_overlay.png");
}
