//! 测试用的最小 ELF32 小端镜像构造器
//!
//! 布局：ELF 头、程序头表、段数据、.symtab/.strtab/.shstrtab、节头表。

const EHDR_SIZE: usize = 52;
const PHDR_SIZE: usize = 32;
const SHDR_SIZE: usize = 40;
const SYM_SIZE: usize = 16;

const PT_LOAD: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;
const STB_GLOBAL: u8 = 1;
const STT_OBJECT: u8 = 1;
const STT_FUNC: u8 = 2;
const SHN_ABS: u16 = 0xfff1;

struct Segment {
    vaddr: u32,
    data: Vec<u8>,
    mem_size: u32,
}

struct Sym {
    name: String,
    value: u32,
    size: u32,
    kind: u8,
}

pub struct ElfBuilder {
    entry: u32,
    machine: u16,
    segments: Vec<Segment>,
    symbols: Vec<Sym>,
    symtab: bool,
}

impl ElfBuilder {
    pub fn new(entry: u32) -> Self {
        Self {
            entry,
            machine: 0xF3,
            segments: Vec::new(),
            symbols: Vec::new(),
            symtab: true,
        }
    }

    pub fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    /// PT_LOAD 段；`mem_size` 大于数据长度的部分是 bss
    pub fn segment(mut self, vaddr: u32, data: &[u8], mem_size: u32) -> Self {
        self.segments.push(Segment {
            vaddr,
            data: data.to_vec(),
            mem_size,
        });
        self
    }

    /// 以小端指令字构造代码段
    pub fn code(self, vaddr: u32, words: &[u32]) -> Self {
        let data: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let len = data.len() as u32;
        self.segment(vaddr, &data, len)
    }

    pub fn func(self, name: &str, value: u32, size: u32) -> Self {
        self.symbol(name, value, size, STT_FUNC)
    }

    pub fn object(self, name: &str, value: u32, size: u32) -> Self {
        self.symbol(name, value, size, STT_OBJECT)
    }

    fn symbol(mut self, name: &str, value: u32, size: u32, kind: u8) -> Self {
        self.symbols.push(Sym {
            name: name.to_string(),
            value,
            size,
            kind,
        });
        self
    }

    pub fn without_symtab(mut self) -> Self {
        self.symtab = false;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = vec![0u8; EHDR_SIZE];

        // 程序头表
        let phoff = if self.segments.is_empty() { 0 } else { out.len() };
        let data_start = out.len() + self.segments.len() * PHDR_SIZE;
        let mut data_off = data_start;
        let mut phdrs = Vec::new();
        for seg in &self.segments {
            let fields = [
                PT_LOAD,
                data_off as u32,
                seg.vaddr,
                seg.vaddr,
                seg.data.len() as u32,
                seg.mem_size,
                0x7, // R | W | X
                4,
            ];
            fields.iter().for_each(|f| phdrs.extend_from_slice(&f.to_le_bytes()));
            data_off += seg.data.len();
        }
        out.extend_from_slice(&phdrs);
        for seg in &self.segments {
            out.extend_from_slice(&seg.data);
        }

        // 符号表与字符串表
        let mut strtab = vec![0u8];
        let mut symtab = vec![0u8; SYM_SIZE];
        for sym in &self.symbols {
            let name_off = strtab.len() as u32;
            strtab.extend_from_slice(sym.name.as_bytes());
            strtab.push(0);

            symtab.extend_from_slice(&name_off.to_le_bytes());
            symtab.extend_from_slice(&sym.value.to_le_bytes());
            symtab.extend_from_slice(&sym.size.to_le_bytes());
            symtab.push((STB_GLOBAL << 4) | sym.kind);
            symtab.push(0);
            symtab.extend_from_slice(&SHN_ABS.to_le_bytes());
        }

        let mut shstrtab = vec![0u8];
        let mut section_name = |name: &str| {
            let off = shstrtab.len() as u32;
            shstrtab.extend_from_slice(name.as_bytes());
            shstrtab.push(0);
            off
        };
        let symtab_name = section_name(".symtab");
        let strtab_name = section_name(".strtab");
        let shstrtab_name = section_name(".shstrtab");

        // 节头：[name, type, flags, addr, offset, size, link, info, addralign, entsize]
        let mut shdrs: Vec<[u32; 10]> = vec![[0; 10]];
        align4(&mut out);
        if self.symtab {
            let symtab_off = out.len() as u32;
            out.extend_from_slice(&symtab);
            let strtab_off = out.len() as u32;
            out.extend_from_slice(&strtab);
            shdrs.push([
                symtab_name,
                SHT_SYMTAB,
                0,
                0,
                symtab_off,
                symtab.len() as u32,
                2,
                1,
                4,
                SYM_SIZE as u32,
            ]);
            shdrs.push([
                strtab_name,
                SHT_STRTAB,
                0,
                0,
                strtab_off,
                strtab.len() as u32,
                0,
                0,
                1,
                0,
            ]);
        }
        let shstrtab_off = out.len() as u32;
        out.extend_from_slice(&shstrtab);
        shdrs.push([
            shstrtab_name,
            SHT_STRTAB,
            0,
            0,
            shstrtab_off,
            shstrtab.len() as u32,
            0,
            0,
            1,
            0,
        ]);

        align4(&mut out);
        let shoff = out.len();
        for shdr in &shdrs {
            shdr.iter().for_each(|f| out.extend_from_slice(&f.to_le_bytes()));
        }

        // ELF 头
        let mut ehdr = Vec::with_capacity(EHDR_SIZE);
        ehdr.extend_from_slice(&[0x7f, b'E', b'L', b'F', 1, 1, 1, 0]);
        ehdr.extend_from_slice(&[0; 8]);
        ehdr.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
        ehdr.extend_from_slice(&self.machine.to_le_bytes());
        ehdr.extend_from_slice(&1u32.to_le_bytes());
        ehdr.extend_from_slice(&self.entry.to_le_bytes());
        ehdr.extend_from_slice(&(phoff as u32).to_le_bytes());
        ehdr.extend_from_slice(&(shoff as u32).to_le_bytes());
        ehdr.extend_from_slice(&0u32.to_le_bytes());
        ehdr.extend_from_slice(&(EHDR_SIZE as u16).to_le_bytes());
        ehdr.extend_from_slice(&(PHDR_SIZE as u16).to_le_bytes());
        ehdr.extend_from_slice(&(self.segments.len() as u16).to_le_bytes());
        ehdr.extend_from_slice(&(SHDR_SIZE as u16).to_le_bytes());
        ehdr.extend_from_slice(&(shdrs.len() as u16).to_le_bytes());
        ehdr.extend_from_slice(&((shdrs.len() - 1) as u16).to_le_bytes());
        out[..EHDR_SIZE].copy_from_slice(&ehdr);

        out
    }
}

fn align4(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}
