use battle_locale::{
    host::{AssetLoaded, StyleLayer},
    placement::{
        AssetLoaderChannel, CameraMatrix, Category, FrameMatrices, PlacePlayer, PlaceScenery,
        PlacementPlugin, PlacementReport,
    },
    settings::PlacementSettings,
    types::{DistanceUnit, GameCircle, GeoCoordinate, distance},
};
use bevy::{log::LogPlugin, math::DMat4, prelude::*};

pub const STARTING_LOCATION: GeoCoordinate = GeoCoordinate::new(21.738836, -97.933290);

fn main() {
    let settings = match PlacementSettings::default_path() {
        Ok(path) => PlacementSettings::load_or_default(&path),
        Err(_) => PlacementSettings::default(),
    };

    let mut app = App::new();
    app.add_plugins(LogPlugin::default())
        .add_plugins(PlacementPlugin {
            settings,
            base_layers: vec![
                StyleLayer {
                    id: "background".to_string(),
                    layer_type: "background".to_string(),
                },
                StyleLayer {
                    id: "place-labels".to_string(),
                    layer_type: "symbol".to_string(),
                },
            ],
        })
        .add_systems(Update, (fake_asset_loader, log_reports));

    app.world_mut().send_event(PlacePlayer { coord: STARTING_LOCATION });
    app.world_mut().send_event(PlaceScenery {
        category: Category::Pine,
        coords: vec![
            GeoCoordinate::new(21.7392, -97.9341),
            GeoCoordinate::new(21.7379, -97.9322),
        ],
    });
    app.world_mut().send_event(PlaceScenery {
        category: Category::Birch,
        coords: vec![GeoCoordinate::new(21.7401, -97.9330), GeoCoordinate::new(123.0, 0.0)],
    });

    // The map would hand over a new camera every frame; pan a little each time.
    for step in 0..3 {
        let pan = DMat4::from_translation(bevy::math::DVec3::new(step as f64 * 1e-5, 0.0, 0.0));
        app.world_mut().resource_mut::<CameraMatrix>().0 = pan;
        app.update();
        let frame = app.world().resource::<FrameMatrices>();
        info!("Frame {step}: {} entities drawn", frame.0.len());
    }

    let circle = GameCircle::new(STARTING_LOCATION, 0.5, DistanceUnit::Kilometers);
    let tome = GeoCoordinate::new(21.7401, -97.9330);
    info!(
        "Tome is {:.3} km away, inside circle: {}",
        distance(STARTING_LOCATION, tome, DistanceUnit::Kilometers),
        circle.contains(tome)
    );
}

/// Stands in for the model loader: every requested model loads on the next frame.
fn fake_asset_loader(channel: Res<AssetLoaderChannel>) {
    while let Ok(request) = channel.0.requests.try_recv() {
        debug!("Loading {}", request.path);
        if channel
            .0
            .completions
            .send(AssetLoaded {
                handle: request.handle,
                result: Ok(()),
            })
            .is_err()
        {
            warn!("Placement stopped listening for assets");
        }
    }
}

fn log_reports(mut reports: EventReader<PlacementReport>) {
    for report in reports.read() {
        match report {
            PlacementReport::Player(Ok(id)) => info!("Player placed as {id}"),
            PlacementReport::Player(Err(err)) => warn!("Player not placed: {err}"),
            PlacementReport::Scenery { category, batch } => {
                for (index, err) in &batch.failures {
                    warn!("{category} #{index} not placed: {err}");
                }
            }
            PlacementReport::Cleared { category, count } => {
                info!("Cleared {count} entities ({category:?})")
            }
        }
    }
}
