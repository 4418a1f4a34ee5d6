pub mod init;
pub mod pokedex;
pub mod quiz;
pub mod search;

/// "mr-mime" -> "Mr-Mime".
pub fn display_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
