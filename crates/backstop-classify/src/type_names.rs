/// Reduce a Rust type name to a small vocabulary safe to show clients
///
/// Accepts anything `std::any::type_name` produces, with or without module
/// paths and references. `Option<T>` coarsens like `T`. Unrecognised types
/// become `object` so concrete type paths never leave the service.
pub fn coarse_type_name(type_name: &str) -> &'static str {
    let mut name = type_name.trim();
    loop {
        let stripped = name.trim_start_matches('&').trim_start_matches("mut ").trim();
        let stripped = stripped
            .strip_prefix("core::option::Option<")
            .or_else(|| stripped.strip_prefix("Option<"))
            .and_then(|inner| inner.strip_suffix('>'))
            .unwrap_or(stripped);
        if stripped == name {
            break;
        }
        name = stripped;
    }

    let last = name.rsplit("::").next().unwrap_or(name);
    match last {
        "i32" | "u32" | "NonZeroI32" | "NonZeroU32" => "int",
        "i64" | "u64" | "i128" | "u128" | "isize" | "usize" | "NonZeroI64" | "NonZeroU64" | "NonZeroUsize" => "long",
        "i16" | "u16" => "short",
        "i8" | "u8" => "byte",
        "f32" => "float",
        "f64" => "double",
        "bool" => "bool",
        "char" => "char",
        "str" | "String" | "Cow<str>" => "string",
        "Uuid" => "uuid",
        _ => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_map_to_their_coarse_names() {
        assert_eq!(coarse_type_name(std::any::type_name::<i32>()), "int");
        assert_eq!(coarse_type_name(std::any::type_name::<u64>()), "long");
        assert_eq!(coarse_type_name(std::any::type_name::<i16>()), "short");
        assert_eq!(coarse_type_name(std::any::type_name::<u8>()), "byte");
        assert_eq!(coarse_type_name(std::any::type_name::<f32>()), "float");
        assert_eq!(coarse_type_name(std::any::type_name::<f64>()), "double");
        assert_eq!(coarse_type_name(std::any::type_name::<bool>()), "bool");
        assert_eq!(coarse_type_name(std::any::type_name::<char>()), "char");
    }

    #[test]
    fn strings_and_options_are_unwrapped() {
        assert_eq!(coarse_type_name(std::any::type_name::<String>()), "string");
        assert_eq!(coarse_type_name(std::any::type_name::<&str>()), "string");
        assert_eq!(coarse_type_name(std::any::type_name::<Option<u32>>()), "int");
        assert_eq!(coarse_type_name("uuid::Uuid"), "uuid");
    }

    #[test]
    fn concrete_types_never_leak() {
        struct OrderId;
        assert_eq!(coarse_type_name(std::any::type_name::<OrderId>()), "object");
        assert_eq!(coarse_type_name(std::any::type_name::<Vec<u8>>()), "object");
    }
}
