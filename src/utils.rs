use flate2::read::GzDecoder;
use std::fs::OpenOptions;
use std::io::{self, stdin, BufReader, Read};
use std::path::Path;

pub fn xopen(path: &Path) -> Result<Box<dyn Read>, io::Error> {
    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::new(stdin())));
    }

    let file = OpenOptions::new().read(true).open(path)?;
    Ok(Box::new(BufReader::new(file)))
}

pub fn xzopen(path: &Path) -> Result<Box<dyn Read>, io::Error> {
    let input = xopen(path)?;
    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        Ok(Box::new(GzDecoder::new(input)))
    } else {
        Ok(input)
    }
}
