use cloudcap::{
    Config, DeviceManager, EventBus, EventFilter, EventLogger, FilteredListener, Input,
    InputController, MemoryChannel,
};
use std::sync::Arc;

const CONFIG: &str = r#"
[[devices]]
id = "5dc1564130xxxxxxxxxxxxxx"
name = "Living room TV"
capabilities = ["selectInput"]
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let bus = Arc::new(EventBus::new());
    bus.add_listener(EventLogger::new(), EventFilter::All, None);
    let recorder = Arc::new(MemoryChannel::new());
    bus.add_listener(
        FilteredListener::new(|e| e.action == "selectInput", Forward(recorder.clone())),
        EventFilter::All,
        None,
    );

    let config = Config::from_toml_str(CONFIG)?;
    let mut manager = DeviceManager::from_config(&config, bus.clone())?;

    let tv = manager
        .device_mut("5dc1564130xxxxxxxxxxxxxx")
        .ok_or("device missing")?;
    tv.capability_mut::<InputController>()
        .ok_or("selectInput missing")?
        .on_select_input(|device_id, input| {
            println!("{device_id}: switching to {input}");
            true
        });

    // request coming from the cloud
    let answer = manager.handle_json(
        r#"{"deviceId":"5dc1564130xxxxxxxxxxxxxx","action":"selectInput","value":{"input":"HDMI 2"}}"#,
    )?;
    println!("response: {answer}");

    // somebody used the remote
    let tv = manager
        .device("5dc1564130xxxxxxxxxxxxxx")
        .ok_or("device missing")?;
    tv.capability::<InputController>()
        .ok_or("selectInput missing")?
        .send_select_input_event(tv.host(), Input::Xbox)?;

    println!("recorded {} event(s)", recorder.events().len());
    Ok(())
}

/// Passes events on to another channel.
struct Forward(Arc<MemoryChannel>);

impl cloudcap::EventListener for Forward {
    fn on_event(&mut self, event: &cloudcap::EventMessage) -> Result<(), cloudcap::ChannelError> {
        use cloudcap::EventChannel;
        self.0.send(event)
    }
}
