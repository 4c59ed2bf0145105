#![no_main]

use libfuzzer_sys::fuzz_target;

use pull_csv::{Config, Parser};

fuzz_target!(|data: &[u8]| {
    let mut strict = Config::new();
    strict.headers(true);

    let mut parser = Parser::from_bytes(data, &strict).unwrap();

    while let Ok(Some(_)) = parser.shift() {}

    // Exhausted parsers stay exhausted, even after an error
    assert!(parser.shift().unwrap().is_none());

    let mut liberal = Config::new();
    liberal.liberal_parsing(true).buffer_size(16);

    let rows = Parser::from_bytes(data, &liberal)
        .unwrap()
        .read_all()
        .unwrap();

    let mut parser = Parser::from_bytes(data, &liberal).unwrap();
    parser.shift().unwrap();
    parser.rewind().unwrap();

    assert_eq!(parser.read_all().unwrap(), rows);
});
