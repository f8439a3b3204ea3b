// ── Light profiles ──
//
// The firmware's product byte (`lightVersionModifier`) tells us which
// channels a controller drives. The default adapter maps it to a profile
// and names new accessories after it.

use serde::Serialize;
use tracing::debug;

use crate::error::CoreError;
use crate::host::AccessoryAdapter;
use crate::model::{Accessory, Device};

/// Channels a light exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    pub brightness: bool,
    pub color: bool,
    pub warm_white: bool,
    pub cold_white: bool,
}

/// What kind of light a device is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LightProfile {
    pub convenient_name: &'static str,
    pub capabilities: Capabilities,
}

impl LightProfile {
    const fn new(convenient_name: &'static str, capabilities: Capabilities) -> Self {
        Self {
            convenient_name,
            capabilities,
        }
    }

    /// Look up the profile for a product byte. Unknown products are
    /// treated as plain RGB controllers.
    pub fn for_product(product: u8) -> Self {
        const RGB: Capabilities = Capabilities {
            brightness: true,
            color: true,
            warm_white: false,
            cold_white: false,
        };
        const RGBW: Capabilities = Capabilities {
            warm_white: true,
            ..RGB
        };
        const RGBWW: Capabilities = Capabilities {
            cold_white: true,
            ..RGBW
        };
        const CCT: Capabilities = Capabilities {
            brightness: true,
            color: false,
            warm_white: true,
            cold_white: true,
        };
        const DIMMER: Capabilities = Capabilities {
            brightness: true,
            color: false,
            warm_white: false,
            cold_white: false,
        };

        match product {
            0x04 | 0x06 | 0x44 => Self::new("RGBW Bulb", RGBW),
            0x07 | 0x25 => Self::new("RGBWW Controller", RGBWW),
            0x35 => Self::new("RGBWW Bulb", RGBWW),
            0x33 | 0x08 | 0xA1 | 0xA2 | 0xA3 => Self::new("RGB Strip", RGB),
            0x09 | 0x1C | 0x52 => Self::new("CCT Light", CCT),
            0x41 => Self::new("Dimmer", DIMMER),
            0x93 | 0x97 => Self::new("Power Socket", Capabilities::default()),
            _ => Self::new("RGB Controller", RGB),
        }
    }

    /// Display name for a newly registered accessory.
    pub fn display_name(&self, device: &Device) -> String {
        format!("{} {}", self.convenient_name, device.unique_id.short())
    }
}

/// Default adapter: profiles from the product table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileAdapter;

impl AccessoryAdapter for ProfileAdapter {
    fn describe(&self, device: &Device) -> Result<LightProfile, CoreError> {
        Ok(LightProfile::for_product(device.light_version_modifier))
    }

    fn attach(&self, accessory: &Accessory) -> Result<(), CoreError> {
        let profile = self.describe(&accessory.context.device)?;
        debug!(
            name = %accessory.display_name(),
            profile = profile.convenient_name,
            capabilities = ?profile.capabilities,
            "attached characteristic handlers"
        );
        Ok(())
    }
}
