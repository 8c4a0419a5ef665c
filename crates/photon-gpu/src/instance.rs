//! Vulkan instance creation.

use crate::error::{GpuError, Result};
use ash::vk;
use std::ffi::{c_void, CStr, CString};

/// Required instance extensions.
pub fn required_instance_extensions(validation: bool) -> Vec<&'static CStr> {
    let mut extensions = vec![
        ash::khr::surface::NAME,
        #[cfg(target_os = "windows")]
        ash::khr::win32_surface::NAME,
        #[cfg(target_os = "linux")]
        ash::khr::xlib_surface::NAME,
        #[cfg(target_os = "linux")]
        ash::khr::wayland_surface::NAME,
        #[cfg(target_os = "macos")]
        ash::ext::metal_surface::NAME,
        #[cfg(target_os = "macos")]
        ash::khr::portability_enumeration::NAME,
    ];

    if validation {
        extensions.push(ash::ext::debug_utils::NAME);
    }

    extensions
}

/// Validation layers to enable when validation is requested.
pub fn validation_layers() -> Vec<&'static CStr> {
    vec![c"VK_LAYER_KHRONOS_validation"]
}

/// Check that every requested layer is available.
///
/// A missing layer aborts startup: running without requested validation
/// would silently change behavior.
unsafe fn check_layer_support(entry: &ash::Entry, layers: &[&CStr]) -> Result<()> {
    let available = entry.enumerate_instance_layer_properties()?;

    for layer in layers {
        let found = available.iter().any(|props| {
            let name = CStr::from_ptr(props.layer_name.as_ptr());
            name == *layer
        });
        if !found {
            return Err(GpuError::UnsupportedFeature(format!(
                "validation layer {}",
                layer.to_string_lossy()
            )));
        }
    }

    Ok(())
}

/// Check that every required instance extension is available.
unsafe fn check_extension_support(entry: &ash::Entry, extensions: &[&CStr]) -> Result<()> {
    let available = entry.enumerate_instance_extension_properties(None)?;

    for extension in extensions {
        let found = available.iter().any(|props| {
            let name = CStr::from_ptr(props.extension_name.as_ptr());
            name == *extension
        });
        if !found {
            return Err(GpuError::UnsupportedFeature(format!(
                "instance extension {}",
                extension.to_string_lossy()
            )));
        }
    }

    Ok(())
}

/// Create a Vulkan instance.
///
/// # Safety
/// The entry must be a valid Vulkan entry point.
pub unsafe fn create_instance(
    entry: &ash::Entry,
    app_name: &str,
    enable_validation: bool,
) -> Result<ash::Instance> {
    let extensions = required_instance_extensions(enable_validation);
    let layers = if enable_validation {
        validation_layers()
    } else {
        vec![]
    };

    check_extension_support(entry, &extensions)?;
    check_layer_support(entry, &layers)?;

    let app_name = CString::new(app_name).unwrap_or_default();
    let engine_name = CString::new("Photon").unwrap_or_default();

    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .engine_name(&engine_name)
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_1);

    let extension_names: Vec<*const i8> = extensions.iter().map(|ext| ext.as_ptr()).collect();
    let layer_names: Vec<*const i8> = layers.iter().map(|l| l.as_ptr()).collect();

    // Required for MoltenVK on macOS
    #[cfg(target_os = "macos")]
    let create_flags = vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
    #[cfg(not(target_os = "macos"))]
    let create_flags = vk::InstanceCreateFlags::empty();

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extension_names)
        .enabled_layer_names(&layer_names)
        .flags(create_flags);

    let instance = entry
        .create_instance(&create_info, None)
        .map_err(|e| GpuError::ResourceCreation {
            what: "Instance",
            source: e,
        })?;

    Ok(instance)
}

/// Route validation messages through tracing.
unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    if data.is_null() {
        return vk::FALSE;
    }

    let message = CStr::from_ptr((*data).p_message).to_string_lossy();

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        tracing::error!(target: "vulkan", "{message}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        tracing::warn!(target: "vulkan", "{message}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        tracing::info!(target: "vulkan", "{message}");
    } else {
        tracing::trace!(target: "vulkan", "{message}");
    }

    vk::FALSE
}

/// Create a debug utils messenger forwarding validation output to tracing.
///
/// # Safety
/// The instance must be valid and created with the debug utils extension.
pub unsafe fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
    let loader = ash::ext::debug_utils::Instance::new(entry, instance);

    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback));

    let messenger = loader
        .create_debug_utils_messenger(&create_info, None)
        .map_err(|e| GpuError::ResourceCreation {
            what: "Debug messenger",
            source: e,
        })?;

    Ok((loader, messenger))
}
