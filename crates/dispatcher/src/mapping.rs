//! Wire enum to internal enum mappings
//!
//! Total functions: unknown wire values fall back to an explicit default.

use contracts::{component, DetectPoint, Protocol, RequestType, WireDetectPoint};

/// Request type reported for a wire protocol
pub fn protocol_to_type(protocol: Protocol) -> RequestType {
    match protocol {
        Protocol::Grpc => RequestType::Grpc,
        Protocol::Http => RequestType::Http,
        Protocol::Unrecognized => RequestType::Rpc,
    }
}

/// Component id of a wire protocol, as registered in the component library
pub fn protocol_to_component(protocol: Protocol) -> i32 {
    match protocol {
        Protocol::Grpc => component::GRPC,
        Protocol::Http => component::HTTP,
        Protocol::Unrecognized => component::RPC,
    }
}

/// Internal detect point of a wire detect point; anything but client/proxy is server
pub fn map_detect_point(detect_point: WireDetectPoint) -> DetectPoint {
    match detect_point {
        WireDetectPoint::Client => DetectPoint::Client,
        WireDetectPoint::Proxy => DetectPoint::Proxy,
        WireDetectPoint::Server | WireDetectPoint::Unrecognized => DetectPoint::Server,
    }
}
