#![no_main]

use codecloak_core::{Language, NameSupply, Obfuscator};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);

    // keep iterations fast; the rename passes are linear per mapped name
    if input.len() > 20_000 {
        return;
    }

    let obfuscator = Obfuscator::default();
    for language in [Language::C, Language::Cpp, Language::Python] {
        let Ok(output) = obfuscator.obfuscate_with(&input, language, NameSupply::seeded(0)) else {
            continue;
        };

        // macro lines never change under C++
        if language == Language::Cpp {
            for line in input.lines().filter(|line| line.trim_start().starts_with("#define")) {
                if !line.contains(&['\\', '\r'][..]) {
                    assert!(output.contains(line.trim_start()), "lost macro {line:?}");
                }
            }
        }
    }
});
