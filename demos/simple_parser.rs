//! Parsing request and response heads with flowhttp-rs.

use flowhttp_rs::parser::parse_response_head;
use flowhttp_rs::parse_request;

fn main() {
    let request_bytes =
        b"GET /search?q=rust&page=2 HTTP/1.1\r\nHost: example.com\r\nUser-Agent: ExampleBrowser/1.0\r\n\r\n";

    match parse_request(request_bytes) {
        Ok(request) => {
            println!("Parsed request head:");
            println!("  {} {} {}", request.method, request.path, request.version);
            println!("  route path: {}", request.route_path());
            for (name, value) in &request.query_params {
                println!("  query {name} = {value}");
            }
            for (name, value) in &request.headers {
                println!("  {name}: {value}");
            }
            println!("  closes after response: {}", request.wants_close());
        }
        Err(err) => println!("Error parsing request: {err}"),
    }

    // HTTP/1.1 requires a Host header
    match parse_request(b"GET / HTTP/1.1\r\nAccept: */*\r\n\r\n") {
        Ok(_) => println!("\nUnexpectedly parsed a request without Host"),
        Err(err) => println!("\nExpected error: {err}"),
    }

    match parse_response_head(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n") {
        Ok(response) => println!(
            "\nParsed response head: {} {:?} ({:?})",
            response.status,
            response.reason,
            response.status_code()
        ),
        Err(err) => println!("\nError parsing response: {err}"),
    }
}
