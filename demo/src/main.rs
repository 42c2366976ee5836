use std::error::Error;

use stage_http::{
    external::dotenv::dotenv, Connection, HttpCode, MemoryUserStore, Server,
};

#[tokio::main]
async fn main() {
    dotenv().ok();
    let address: String = format!("0.0.0.0:{}", 9000);
    let mut server = Server::new(&address).await.unwrap();
    server.set_verifier(MemoryUserStore::with_users([("admin", "admin")]));

    println!("start server on: {}", address);
    loop {
        match server.accept().await {
            Ok(accept) => tokio::spawn(async move {
                let mut conn = accept.into_connection();
                www_service(&mut conn).await.unwrap_or_else(|e| {
                    println!("an error occured; error = {:?}", e);
                });
            }),
            Err(e) => {
                println!("failed to accept connection: {e:?}");
                continue;
            }
        };
    }
}

async fn www_service(conn: &mut Connection) -> Result<(), Box<dyn Error + Send + Sync>> {
    loop {
        let code = conn.read_request().await?;
        let (status, body) = match code {
            HttpCode::GetRequest => {
                let request = conn.request();
                println!(
                    "request: {} {} HTTP/{} form={:?}",
                    request.method(),
                    request.path(),
                    request.version(),
                    request.post_fields()
                );
                ("200 OK", format!("resource: {}\n", request.path()))
            }
            HttpCode::BadRequest => ("400 Bad Request", "bad request\n".to_string()),
            _ => return Ok(()),
        };

        let keep_alive = code == HttpCode::GetRequest && conn.is_keep_alive();
        let connection = if keep_alive { "keep-alive" } else { "close" };
        conn.write_buffer_mut().append_str(&format!(
            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: {}\r\n\r\n{}",
            status,
            body.len(),
            connection,
            body
        ));
        conn.flush().await?;

        if !keep_alive {
            return Ok(());
        }
        conn.reset();
    }
}
