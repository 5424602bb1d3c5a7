use stripe::Client;

pub fn create_client(secret_key: &str) -> Client {
    Client::new(secret_key)
}
