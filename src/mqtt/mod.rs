//! MQTT broker client (rumqttc, MQTT 3.1.1, QoS 0)

mod client;

pub use client::{MqttConfig, MqttConnector};
