mod filter;
mod slice;
